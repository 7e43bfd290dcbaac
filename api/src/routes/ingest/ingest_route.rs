//! POST /ingest: stores an uploaded document in the knowledge base.

use std::{path::Path, sync::Arc};

use axum::{
    Json,
    extract::{Multipart, State},
};
use tracing::{debug, info};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::ingest::ingest_response::IngestResponse,
};

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

/// Handler: POST /ingest
///
/// The upload is written under its original name into a temporary directory
/// that is removed when the handler returns, then loaded with the file name as
/// `source`.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/ingest -F 'file=@handbook.pdf'
/// ```
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<IngestResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(upload_name)
            .ok_or_else(|| AppError::BadRequest("uploaded file has no usable name".into()))?;
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) = upload.ok_or_else(|| {
        AppError::BadRequest(format!("multipart field `{FILE_FIELD}` is required"))
    })?;
    debug!(file = %file_name, bytes = bytes.len(), "upload received");

    let dir = tempfile::tempdir().map_err(AppError::Upload)?;
    let path = dir.path().join(&file_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(AppError::Upload)?;

    let report = state.store.ingest_file(&path, Some(&file_name)).await?;
    if report.chunks == 0 {
        return Err(AppError::BadRequest(format!(
            "{file_name} contains no extractable text"
        )));
    }
    info!(file = %file_name, chunks = report.chunks, "document ingested");

    Ok(Json(IngestResponse {
        message: format!("Successfully ingested {file_name}"),
        chunks_count: report.chunks,
    }))
}

/// Final path component of a client-supplied name; `None` if nothing usable remains.
fn upload_name(raw: &str) -> Option<String> {
    let name = Path::new(raw.trim()).file_name()?.to_string_lossy();
    (!name.is_empty()).then(|| name.into_owned())
}
