//! Runtime and collection configuration.

use std::str::FromStr;

use crate::errors::RagError;

/// Distance function used for the vector space.
///
/// Fixed per collection at creation time; search always uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine similarity (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            other => Err(RagError::Config(format!(
                "unknown distance '{other}' (expected cosine|dot)"
            ))),
        }
    }
}

/// Schema of a collection: name, dimensionality and metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub vector_size: usize,
    pub distance: DistanceKind,
}

/// Which vector index implementation backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    Qdrant,
    Memory,
}

/// Which embedding implementation backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Batch embeddings from the Ollama embedding profile.
    Ollama,
    /// Offline feature hashing.
    Hash,
}

/// Configuration for RAG ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Dimensionality every embedding must have.
    pub embedding_dim: usize,
    /// Number of texts per embedding request.
    pub embedding_batch: usize,
    /// Embedding requests in flight during ingestion.
    pub embedding_concurrency: usize,
    /// Instruction prepended to queries only (asymmetric embedding models).
    pub query_prefix: Option<String>,
    /// Chunk budget in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    pub index_backend: IndexBackend,
    pub embedding_backend: EmbeddingBackend,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 256,
            exact_search: false,
            embedding_dim: 384,
            embedding_batch: 64,
            embedding_concurrency: 2,
            query_prefix: None,
            chunk_size: 512,
            chunk_overlap: 64,
            index_backend: IndexBackend::Qdrant,
            embedding_backend: EmbeddingBackend::Ollama,
        }
    }

    /// Reads the process environment.
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok())
    }

    /// Builds the config through a variable lookup, then validates it.
    ///
    /// Recognised variables: `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION`,
    /// `QDRANT_DISTANCE`, `QDRANT_BATCH_SIZE`, `RAG_EXACT_SEARCH`, `EMBEDDING_DIM`,
    /// `EMBEDDING_BATCH_SIZE`, `EMBEDDING_CONCURRENCY`, `EMBEDDING_QUERY_PREFIX`,
    /// `EMBEDDING_PROVIDER` (`ollama|hash`), `VECTOR_INDEX` (`qdrant|memory`),
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP`.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let mut cfg = Self::new_default(
            get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string()),
            get("QDRANT_COLLECTION").unwrap_or_else(|| "enterprise_rag".to_string()),
        );
        cfg.qdrant_api_key = get("QDRANT_API_KEY");
        if let Some(d) = get("QDRANT_DISTANCE") {
            cfg.distance = d.parse()?;
        }
        cfg.upsert_batch = parse_or(lookup, "QDRANT_BATCH_SIZE", cfg.upsert_batch)?;
        cfg.exact_search = parse_or(lookup, "RAG_EXACT_SEARCH", cfg.exact_search)?;
        cfg.embedding_dim = parse_or(lookup, "EMBEDDING_DIM", cfg.embedding_dim)?;
        cfg.embedding_batch = parse_or(lookup, "EMBEDDING_BATCH_SIZE", cfg.embedding_batch)?;
        cfg.embedding_concurrency =
            parse_or(lookup, "EMBEDDING_CONCURRENCY", cfg.embedding_concurrency)?;
        cfg.query_prefix = lookup("EMBEDDING_QUERY_PREFIX").filter(|p| !p.is_empty());
        cfg.chunk_size = parse_or(lookup, "CHUNK_SIZE", cfg.chunk_size)?;
        cfg.chunk_overlap = parse_or(lookup, "CHUNK_OVERLAP", cfg.chunk_overlap)?;

        cfg.index_backend = match get("VECTOR_INDEX").as_deref().map(str::trim) {
            None | Some("qdrant") => IndexBackend::Qdrant,
            Some("memory") => IndexBackend::Memory,
            Some(other) => {
                return Err(RagError::Config(format!(
                    "VECTOR_INDEX must be qdrant|memory, got '{other}'"
                )));
            }
        };
        cfg.embedding_backend = match get("EMBEDDING_PROVIDER").as_deref().map(str::trim) {
            None | Some("ollama") => EmbeddingBackend::Ollama,
            Some("hash") => EmbeddingBackend::Hash,
            Some(other) => {
                return Err(RagError::Config(format!(
                    "EMBEDDING_PROVIDER must be ollama|hash, got '{other}'"
                )));
            }
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_dim == 0 {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if self.embedding_batch == 0 {
            return Err(RagError::Config("embedding_batch must be > 0".into()));
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than a non-zero chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Schema of the configured collection.
    pub fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec {
            name: self.collection.clone(),
            vector_size: self.embedding_dim,
            distance: self.distance,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RagError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{key}: cannot parse '{v}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = RagConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(cfg.qdrant_url, "http://localhost:6334");
        assert_eq!(cfg.collection, "enterprise_rag");
        assert_eq!(cfg.embedding_dim, 384);
        assert_eq!((cfg.chunk_size, cfg.chunk_overlap), (512, 64));
        assert_eq!(cfg.upsert_batch, 256);
        assert_eq!(cfg.index_backend, IndexBackend::Qdrant);
        assert_eq!(cfg.embedding_backend, EmbeddingBackend::Ollama);
        assert_eq!(cfg.query_prefix, None);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = RagConfig::from_lookup(&lookup_from(&[
            ("VECTOR_INDEX", "memory"),
            ("EMBEDDING_PROVIDER", "hash"),
            ("EMBEDDING_DIM", "64"),
            ("QDRANT_DISTANCE", "Dot"),
            ("EMBEDDING_QUERY_PREFIX", "query: "),
            ("RAG_EXACT_SEARCH", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.index_backend, IndexBackend::Memory);
        assert_eq!(cfg.embedding_backend, EmbeddingBackend::Hash);
        assert_eq!(cfg.collection_spec().vector_size, 64);
        assert_eq!(cfg.distance, DistanceKind::Dot);
        assert_eq!(cfg.query_prefix.as_deref(), Some("query: "));
        assert!(cfg.exact_search);
    }

    #[test]
    fn rejects_bad_values() {
        for pairs in [
            vec![("CHUNK_SIZE", "100"), ("CHUNK_OVERLAP", "100")],
            vec![("CHUNK_SIZE", "0")],
            vec![("EMBEDDING_DIM", "abc")],
            vec![("VECTOR_INDEX", "faiss")],
            vec![("QDRANT_DISTANCE", "euclid")],
        ] {
            let err = RagConfig::from_lookup(&lookup_from(&pairs)).unwrap_err();
            assert!(matches!(err, RagError::Config(_)), "{pairs:?} -> {err}");
        }
    }
}
