//! End-to-end ingestion: documents → chunks → embeddings → points → index.
//!
//! Every embedding is computed before the first write, so an embedding failure
//! leaves the index untouched. Points are upserted in batches of
//! `RagConfig::upsert_batch`; when a batch fails, the batches already written
//! for this call are deleted again before the error is returned.

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::chunker::Chunker;
use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{Document, IndexedPoint, PointPayload};

/// Counters returned by a successful ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub points: usize,
}

/// Chunks, embeds and stores `documents` into the configured collection.
///
/// # Errors
/// Embedding, dimension or index errors. A failed call leaves no points behind
/// unless the rollback itself fails, which is logged.
pub async fn ingest_documents(
    cfg: &RagConfig,
    chunker: &Chunker,
    embedder: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
    documents: &[Document],
) -> Result<IngestReport, RagError> {
    info!(documents = documents.len(), collection = %cfg.collection, "ingesting documents");

    let chunks = chunker.chunk_documents(documents);
    if chunks.is_empty() {
        debug!("No chunks produced; nothing to store");
        return Ok(IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        });
    }

    if embedder.dimension() != cfg.embedding_dim {
        return Err(RagError::VectorSizeMismatch {
            got: embedder.dimension(),
            want: cfg.embedding_dim,
        });
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
    let vectors = embed_all(
        &texts,
        embedder,
        cfg.embedding_batch,
        cfg.embedding_concurrency,
    )
    .await?;

    let points: Vec<IndexedPoint> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexedPoint {
            id: None,
            vector,
            payload: PointPayload::from_chunk(chunk),
        })
        .collect();

    index.ensure_collection(&cfg.collection_spec()).await?;

    let mut written = Vec::with_capacity(points.len());
    let batch_size = cfg.upsert_batch.max(1);
    let mut points = points.into_iter().peekable();
    while points.peek().is_some() {
        let batch: Vec<IndexedPoint> = points.by_ref().take(batch_size).collect();
        match index.upsert(&cfg.collection, batch).await {
            Ok(ids) => written.extend(ids),
            Err(err) => {
                rollback(index, &cfg.collection, &written).await;
                return Err(err);
            }
        }
    }
    let stored = written.len();

    let report = IngestReport {
        documents: documents.len(),
        chunks: chunks.len(),
        points: stored,
    };
    info!(
        chunks = report.chunks,
        points = report.points,
        collection = %cfg.collection,
        "ingestion finished"
    );
    Ok(report)
}

/// Deletes points written by a failed ingestion.
async fn rollback(index: &dyn VectorIndex, collection: &str, ids: &[Uuid]) {
    if ids.is_empty() {
        return;
    }
    warn!(collection, points = ids.len(), "upsert failed; removing points already written");
    if let Err(err) = index.delete(collection, ids).await {
        error!(collection, points = ids.len(), error = %err, "rollback failed; points remain");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionSpec;
    use crate::embed::{EmbedFuture, hash::HashEmbedder};
    use crate::index::memory::InMemoryIndex;
    use crate::index::{CollectionStatus, IndexFuture};
    use crate::record::SearchHit;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cfg(dim: usize) -> RagConfig {
        let mut cfg = RagConfig::new_default("http://localhost:6334", "docs");
        cfg.embedding_dim = dim;
        cfg.upsert_batch = 2;
        cfg.embedding_batch = 3;
        cfg
    }

    struct FailingEmbedder;

    impl EmbeddingsProvider for FailingEmbedder {
        fn embed_documents<'a>(&'a self, _: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async { Err(RagError::Embedding("backend down".into())) })
        }
        fn embed_query<'a>(&'a self, _: &'a str) -> EmbedFuture<'a, Vec<f32>> {
            Box::pin(async { Err(RagError::Embedding("backend down".into())) })
        }
        fn dimension(&self) -> usize {
            16
        }
    }

    /// In-memory index whose n-th upsert call fails.
    struct FlakyIndex {
        inner: InMemoryIndex,
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl VectorIndex for FlakyIndex {
        fn ensure_collection<'a>(
            &'a self,
            spec: &'a CollectionSpec,
        ) -> IndexFuture<'a, CollectionStatus> {
            self.inner.ensure_collection(spec)
        }

        fn upsert<'a>(
            &'a self,
            collection: &'a str,
            points: Vec<IndexedPoint>,
        ) -> IndexFuture<'a, Vec<Uuid>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Box::pin(async { Err(RagError::Qdrant("connection reset".into())) });
            }
            self.inner.upsert(collection, points)
        }

        fn search<'a>(
            &'a self,
            collection: &'a str,
            vector: &'a [f32],
            k: usize,
        ) -> IndexFuture<'a, Vec<SearchHit>> {
            self.inner.search(collection, vector, k)
        }

        fn delete<'a>(&'a self, collection: &'a str, ids: &'a [Uuid]) -> IndexFuture<'a, ()> {
            self.inner.delete(collection, ids)
        }
    }

    #[tokio::test]
    async fn failed_batch_rolls_back_earlier_batches() {
        let index = FlakyIndex {
            inner: InMemoryIndex::new(),
            calls: AtomicUsize::new(0),
            fail_on: 2,
        };
        let doc = Document::new("lorem ipsum dolor sit amet ".repeat(10));

        let err = ingest_documents(
            &cfg(16),
            &Chunker::new(40, 8).unwrap(),
            &HashEmbedder::new(16).unwrap(),
            &index,
            &[doc],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::Qdrant(_)));
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
        assert_eq!(index.inner.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stores_every_chunk_in_batches() {
        let cfg = cfg(16);
        let chunker = Chunker::new(40, 8).unwrap();
        let index = InMemoryIndex::new();
        let mut meta = BTreeMap::new();
        meta.insert("source".to_string(), json!("manual.txt"));
        let doc = Document::with_metadata("lorem ipsum dolor sit amet ".repeat(10), meta);

        let embedder = HashEmbedder::new(16).unwrap();
        let report = ingest_documents(&cfg, &chunker, &embedder, &index, &[doc])
            .await
            .unwrap();
        assert!(report.chunks > 2);
        assert_eq!(report.points, report.chunks);
        assert_eq!(index.count("docs").await.unwrap(), report.chunks);

        let hits = index.search("docs", &[0.1; 16], 1).await.unwrap();
        assert_eq!(hits[0].payload["source"], json!("manual.txt"));
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() {
        let cfg = cfg(16);
        let index = InMemoryIndex::new();
        let err = ingest_documents(
            &cfg,
            &Chunker::default(),
            &FailingEmbedder,
            &index,
            &[Document::new("some text")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert!(matches!(
            index.count("docs").await,
            Err(RagError::CollectionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn dimension_conflict_is_fatal() {
        let index = InMemoryIndex::new();
        let err = ingest_documents(
            &cfg(384),
            &Chunker::default(),
            &HashEmbedder::new(16).unwrap(),
            &index,
            &[Document::new("text")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 16, want: 384 }));
    }

    #[tokio::test]
    async fn blank_documents_produce_empty_report() {
        let index = InMemoryIndex::new();
        let report = ingest_documents(
            &cfg(16),
            &Chunker::default(),
            &HashEmbedder::new(16).unwrap(),
            &index,
            &[Document::new("   ")],
        )
        .await
        .unwrap();
        assert_eq!(report, IngestReport { documents: 1, chunks: 0, points: 0 });
    }
}
