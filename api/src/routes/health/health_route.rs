use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::core::app_state::AppState;

/// Handler: GET /health (liveness only, touches no backend).
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler: GET /health/backends
///
/// Probes every distinct LLM profile. Always 200; check `ok` per entry.
pub async fn backends(State(state): State<Arc<AppState>>) -> Json<Vec<HealthStatus>> {
    Json(state.llm.health_all().await)
}
