//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (embedding, index, top_k).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// The request cannot be served as given (e.g. blank query).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid environment configuration.
    #[error("config error: {0}")]
    Config(String),
}
