//! High-level RAG facade: ingestion + retrieval over a vector index.
//!
//! This crate provides a clean API to:
//! - Load `.txt`, `.md` and `.pdf` files into documents
//! - Split documents into overlapping chunks and embed them
//! - Store vectors in Qdrant (or an in-process index) and retrieve top-K context
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

pub mod chunker;
pub mod config;
pub mod embed;
mod embed_pool;
pub mod errors;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod record;
pub mod retrieve;

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use tracing::{debug, info, trace};

pub use chunker::Chunker;
pub use config::{CollectionSpec, DistanceKind, EmbeddingBackend, IndexBackend, RagConfig};
pub use embed::{EmbeddingsProvider, hash::HashEmbedder, ollama::OllamaEmbedder};
pub use errors::{LoadError, RagError};
pub use index::{CollectionStatus, VectorIndex, memory::InMemoryIndex, qdrant::QdrantIndex};
pub use ingest::IngestReport;
pub use record::{Chunk, Document, IndexedPoint, PointPayload, RetrievedContext, SearchHit};
pub use retrieve::{DEFAULT_TOP_K, Retriever};

/// Facade that wires configuration, chunker, embedder and vector index.
///
/// This is the single entry point recommended for application code. Build it
/// once at startup and share it behind an `Arc`.
pub struct RagStore {
    cfg: RagConfig,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingsProvider>,
    index: Arc<dyn VectorIndex>,
}

impl RagStore {
    /// Wires explicit components.
    ///
    /// # Errors
    /// `RagError::Config` for invalid settings, `RagError::VectorSizeMismatch`
    /// when the embedder dimension differs from `cfg.embedding_dim`.
    pub fn new(
        cfg: RagConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        if embedder.dimension() != cfg.embedding_dim {
            return Err(RagError::VectorSizeMismatch {
                got: embedder.dimension(),
                want: cfg.embedding_dim,
            });
        }
        let chunker = Chunker::new(cfg.chunk_size, cfg.chunk_overlap)?;
        trace!("RagStore::new collection={}", cfg.collection);
        Ok(Self {
            cfg,
            chunker,
            embedder,
            index,
        })
    }

    /// Builds embedder and index from the backends selected in `cfg`.
    ///
    /// `svc` backs the Ollama embedder; it is unused with the hash embedder.
    pub fn from_config(cfg: RagConfig, svc: Arc<LlmServiceProfiles>) -> Result<Self, RagError> {
        let embedder: Arc<dyn EmbeddingsProvider> = match cfg.embedding_backend {
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(embed::ollama::OllamaConfig {
                svc,
                dim: cfg.embedding_dim,
                query_prefix: cfg.query_prefix.clone(),
            })),
            EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(cfg.embedding_dim)?),
        };
        let index: Arc<dyn VectorIndex> = match cfg.index_backend {
            IndexBackend::Qdrant => Arc::new(QdrantIndex::new(&cfg)?),
            IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
        };
        info!(
            collection = %cfg.collection,
            index = ?cfg.index_backend,
            embedder = ?cfg.embedding_backend,
            dim = cfg.embedding_dim,
            "rag store configured"
        );
        Self::new(cfg, embedder, index)
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Creates the configured collection if missing and checks its schema otherwise.
    pub async fn ensure_collection(&self) -> Result<CollectionStatus, RagError> {
        self.index.ensure_collection(&self.cfg.collection_spec()).await
    }

    /// Chunks, embeds and stores already loaded documents.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport, RagError> {
        ingest::ingest_documents(
            &self.cfg,
            &self.chunker,
            self.embedder.as_ref(),
            self.index.as_ref(),
            documents,
        )
        .await
    }

    /// Loads and ingests one file. `source` overrides the `source` label.
    ///
    /// # Errors
    /// `RagError::Load` when the file cannot be turned into documents.
    pub async fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        source: Option<&str>,
    ) -> Result<IngestReport, RagError> {
        let path = path.as_ref();
        debug!("RagStore::ingest_file path={:?}", path);
        let docs = match source {
            Some(label) => loader::load_file_as(path, label).await?,
            None => loader::load_file(path).await?,
        };
        self.ingest_documents(&docs).await
    }

    /// Loads every supported file under `dir` and ingests them.
    pub async fn ingest_directory(&self, dir: impl AsRef<Path>) -> Result<IngestReport, RagError> {
        let docs = loader::load_directory(dir).await?;
        self.ingest_documents(&docs).await
    }

    /// Retriever over the configured collection.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.index),
            self.cfg.collection.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn memory_store(dim: usize) -> RagStore {
        let mut cfg = RagConfig::new_default("http://localhost:6334", "enterprise_rag");
        cfg.embedding_dim = dim;
        RagStore::new(
            cfg,
            Arc::new(HashEmbedder::new(dim).unwrap()),
            Arc::new(InMemoryIndex::new()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_embedder_with_wrong_dimension() {
        let cfg = RagConfig::new_default("http://localhost:6334", "enterprise_rag");
        let err = RagStore::new(
            cfg,
            Arc::new(HashEmbedder::new(16).unwrap()),
            Arc::new(InMemoryIndex::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 16, want: 384 }));
    }

    #[tokio::test]
    async fn ingested_file_is_retrievable_with_upload_label() {
        let store = memory_store(256);
        assert_eq!(store.ensure_collection().await.unwrap(), CollectionStatus::Created);
        assert_eq!(store.ensure_collection().await.unwrap(), CollectionStatus::Existing);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.txt");
        fs::write(
            &path,
            "Error 504 means the upstream gateway timed out.\n\nError 404 means not found.",
        )
        .unwrap();

        let report = store.ingest_file(&path, Some("errors.txt")).await.unwrap();
        assert_eq!(report, IngestReport { documents: 1, chunks: 1, points: 1 });

        let ctx = store.retriever().retrieve("Error 504", 5).await.unwrap();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].source, "errors.txt");
        assert!(ctx[0].content.contains("504"));
    }

    #[tokio::test]
    async fn unsupported_upload_is_a_load_error() {
        let store = memory_store(32);
        store.ensure_collection().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "a,b").unwrap();

        let err = store.ingest_file(&path, None).await.unwrap_err();
        assert!(matches!(err, RagError::Load(LoadError::UnsupportedType { .. })));
        assert!(store.retriever().retrieve("a", 3).await.unwrap().is_empty());
    }
}
