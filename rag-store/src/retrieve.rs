//! Retrieval: embed the query, search the index, project hits into context.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::RetrievedContext;

/// Default number of hits returned when the caller does not specify `top_k`.
pub const DEFAULT_TOP_K: usize = 5;

/// Read-only view over one collection.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingsProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    score_floor: Option<f32>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            score_floor: None,
        }
    }

    /// Drops hits scoring below `floor`. `None` keeps every hit.
    pub fn with_score_floor(mut self, floor: Option<f32>) -> Self {
        self.score_floor = floor;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns up to `top_k` contexts ordered by descending score.
    ///
    /// Missing payload fields project to `content = ""` and `source = "Unknown"`.
    ///
    /// # Errors
    /// [`RagError::InvalidInput`] when `top_k == 0` (checked before any backend
    /// call), otherwise embedding or index errors.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>, RagError> {
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".into()));
        }
        trace!(collection = %self.collection, top_k, "retrieve");

        let vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(&self.collection, &vector, top_k).await?;
        let total = hits.len();

        let out: Vec<RetrievedContext> = hits
            .into_iter()
            .map(RetrievedContext::from)
            .filter(|c| self.score_floor.is_none_or(|floor| c.score >= floor))
            .collect();

        debug!(
            collection = %self.collection,
            hits = total,
            kept = out.len(),
            "retrieval finished"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::config::{CollectionSpec, DistanceKind};
    use crate::embed::hash::HashEmbedder;
    use crate::index::memory::InMemoryIndex;
    use crate::record::{Document, IndexedPoint, PointPayload};

    async fn seeded(texts: &[&str]) -> Retriever {
        let embedder = Arc::new(HashEmbedder::new(128).unwrap());
        let index = Arc::new(InMemoryIndex::new());
        index
            .ensure_collection(&CollectionSpec {
                name: "docs".into(),
                vector_size: 128,
                distance: DistanceKind::Cosine,
            })
            .await
            .unwrap();

        let docs: Vec<Document> = texts.iter().map(|t| Document::new(*t)).collect();
        let chunks = Chunker::default().chunk_documents(&docs);
        let contents: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
        let vectors = embedder.embed_documents(&contents).await.unwrap();
        let points = chunks
            .iter()
            .zip(vectors)
            .map(|(c, vector)| IndexedPoint {
                id: None,
                vector,
                payload: PointPayload::from_chunk(c),
            })
            .collect();
        index.upsert("docs", points).await.unwrap();

        Retriever::new(embedder, index, "docs")
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let r = seeded(&["anything"]).await;
        assert!(matches!(r.retrieve("q", 0).await, Err(RagError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn best_match_comes_first_with_defaults_applied() {
        let r = seeded(&[
            "Error 504 means the upstream gateway timed out.",
            "The cafeteria serves lunch at noon.",
            "Disk quota exceeded errors appear when storage is full.",
        ])
        .await;

        let ctx = r.retrieve("What does Error 504 mean?", 2).await.unwrap();
        assert_eq!(ctx.len(), 2);
        assert!(ctx[0].content.contains("504"));
        assert_eq!(ctx[0].source, "Unknown");
        assert!(ctx[0].score >= ctx[1].score);
    }

    #[tokio::test]
    async fn score_floor_filters_weak_hits() {
        let r = seeded(&["alpha beta gamma", "completely different words"])
            .await
            .with_score_floor(Some(0.99));
        let ctx = r.retrieve("alpha beta gamma", 5).await.unwrap();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].content, "alpha beta gamma");
    }
}
