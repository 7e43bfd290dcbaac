use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Boxed future returned by embedding providers.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Async because real providers (Ollama) perform HTTP requests. Implementations
/// must be deterministic, preserve batch order (`out[i]` belongs to `texts[i]`)
/// and return vectors of exactly [`EmbeddingsProvider::dimension`] components.
/// Blank texts embed to the zero vector instead of failing the batch.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds chunk texts for indexing.
    fn embed_documents<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>>;

    /// Embeds a query into the same vector space as the documents.
    fn embed_query<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>>;

    /// Output dimensionality.
    fn dimension(&self) -> usize;
}

/// Rejects vectors whose length differs from the configured dimension.
pub(crate) fn check_dimension(vector: &[f32], want: usize) -> Result<(), RagError> {
    if vector.len() != want {
        return Err(RagError::VectorSizeMismatch {
            got: vector.len(),
            want,
        });
    }
    Ok(())
}

pub mod hash;
pub mod ollama;
