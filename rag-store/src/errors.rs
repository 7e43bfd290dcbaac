//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Caller supplied an argument that can never succeed (e.g. `top_k == 0`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Mismatch in vector dimensionality between embedder and collection.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The target collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Embedding backend failures.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Document loading failures.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<ai_llm_service::AiLlmError> for RagError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        RagError::Embedding(err.to_string())
    }
}

/// Errors raised while turning files into documents.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The extension is not one of `.txt`, `.md`, `.pdf`.
    #[error("unsupported file type: {extension:?} ({})", .path.display())]
    UnsupportedType { path: PathBuf, extension: String },

    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Text file is not valid UTF-8.
    #[error("{} is not valid UTF-8", .0.display())]
    Decode(PathBuf),

    /// PDF text extraction failed.
    #[error("cannot extract text from {}: {reason}", .path.display())]
    Pdf { path: PathBuf, reason: String },
}
