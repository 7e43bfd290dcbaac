//! Batched embedding executor with bounded concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, embed::check_dimension, errors::RagError};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Embeds `texts` in batches of `batch_size`, keeping at most `concurrency`
/// requests in flight.
///
/// Output order matches input order. Every vector is checked against
/// `provider.dimension()`.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if dimensions mismatch,
/// or the provider's error if a batch fails.
pub async fn embed_all(
    texts: &[String],
    provider: &dyn EmbeddingsProvider,
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    if texts.is_empty() {
        debug!("embed_pool::embed_all: nothing to embed");
        return Ok(Vec::new());
    }
    let batch_size = batch_size.max(1);
    info!(
        "embed_pool::embed_all: total={} batch={} concurrency={}",
        texts.len(),
        batch_size,
        concurrency
    );

    let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batch_size))
        .map(|batch| provider.embed_documents(batch))
        .boxed()
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let want = provider.dimension();
    let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
    if vectors.len() != texts.len() {
        return Err(RagError::Embedding(format!(
            "provider returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    for v in &vectors {
        check_dimension(v, want)?;
    }

    debug!("embed_pool::embed_all: embeddings ready");
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::hash::HashEmbedder;

    #[tokio::test]
    async fn batches_preserve_order() {
        let provider = HashEmbedder::new(32).unwrap();
        let texts: Vec<String> = (0..11).map(|i| format!("text number {i}")).collect();
        let batched = embed_all(&texts, &provider, 3, 4).await.unwrap();
        let single = provider.embed_documents(&texts).await.unwrap();
        assert_eq!(batched, single);
    }

    #[tokio::test]
    async fn empty_input_is_ok() {
        let provider = HashEmbedder::new(8).unwrap();
        assert!(embed_all(&[], &provider, 8, 1).await.unwrap().is_empty());
    }
}
