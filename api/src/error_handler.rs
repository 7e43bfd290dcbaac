use ai_llm_service::AiLlmError;
use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::{LoadError, RagError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error("invalid configuration: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    #[error("failed to store upload: {0}")]
    Upload(#[source] std::io::Error),

    // --- Request / pipeline ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Contextor(#[from] ContextorError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rag(err) | AppError::Contextor(ContextorError::Rag(err)) => rag_status(err),
            AppError::Contextor(ContextorError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Contextor(ContextorError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,

            // startup-only
            AppError::Llm(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind { .. } | AppError::Server(_) | AppError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Upload(_) => "UPLOAD_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Rag(err) | AppError::Contextor(ContextorError::Rag(err)) => rag_code(err),
            AppError::Contextor(ContextorError::InvalidInput(_)) => "BAD_REQUEST",
            AppError::Contextor(ContextorError::Config(_)) => "CONFIG_ERROR",
        }
    }
}

fn rag_status(err: &RagError) -> StatusCode {
    match err {
        RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RagError::Load(LoadError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        RagError::Load(_) => StatusCode::BAD_REQUEST,
        RagError::Qdrant(_) | RagError::Embedding(_) | RagError::CollectionNotFound(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rag_code(err: &RagError) -> &'static str {
    match err {
        RagError::InvalidInput(_) => "BAD_REQUEST",
        RagError::Load(LoadError::UnsupportedType { .. }) => "UNSUPPORTED_FILE_TYPE",
        RagError::Load(LoadError::NotFound(_)) => "FILE_NOT_FOUND",
        RagError::Load(LoadError::Io { .. }) => "IO_ERROR",
        RagError::Load(_) => "UNREADABLE_FILE",
        RagError::Qdrant(_) | RagError::CollectionNotFound(_) => "VECTOR_INDEX_UNAVAILABLE",
        RagError::Embedding(_) => "EMBEDDING_FAILED",
        RagError::VectorSizeMismatch { .. } => "VECTOR_SIZE_MISMATCH",
        _ => "INTERNAL_ERROR",
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        }
        let body = ErrorBody {
            error: self.error_code(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
