//! POST /query: answers a question grounded in the ingested documents.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::query::query_request::{QueryRequest, QueryResponse},
};

/// Handler: POST /query
///
/// LLM failures do not fail the request: the answer then reads
/// `Error generating answer: ...` and `context` still lists what was retrieved.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/query \
///   -H 'content-type: application/json' \
///   -d '{"query":"What does Error 504 mean?","top_k":5}'
/// ```
pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<QueryResponse>> {
    let Json(body) = body?;
    let result = state
        .pipeline
        .run_with_top_k(&body.query, body.top_k)
        .await?;
    Ok(Json(result.into()))
}
