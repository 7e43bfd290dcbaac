//! HTTP surface of the RAG backend.
//!
//! | Method | Path               | Purpose                                  |
//! |--------|--------------------|------------------------------------------|
//! | POST   | `/ingest`          | multipart upload of a `.txt`/`.md`/`.pdf` |
//! | POST   | `/query`           | grounded answer plus retrieved context   |
//! | GET    | `/health`          | liveness                                 |
//! | GET    | `/health/backends` | LLM profile probes                       |

use std::sync::Arc;

pub mod core;
pub mod error_handler;
mod routes;

use ai_llm_service::LlmServiceProfiles;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use contextor::{ContextorConfig, Generator, RagPipeline};
use rag_store::{RagConfig, RagStore};
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    core::{app_state::AppState, config::ApiConfig},
    error_handler::AppError,
    routes::{
        health::health_route::{backends, health},
        ingest::ingest_route::ingest,
        query::query_route::query,
    },
};

/// Wires every backend from the environment and serves until Ctrl+C.
///
/// The vector collection is created (or its schema checked) before the
/// listener binds, so a dimension mismatch stops the process at startup.
pub async fn start() -> Result<(), AppError> {
    let api_cfg = ApiConfig::from_env()?;
    let llm = Arc::new(LlmServiceProfiles::from_env()?);
    let store = Arc::new(RagStore::from_config(RagConfig::from_env()?, Arc::clone(&llm))?);

    let status = store.ensure_collection().await?;
    info!(collection = %store.config().collection, ?status, "vector collection ready");

    let pipeline = RagPipeline::new(
        store.retriever(),
        Generator::new(llm.clone()),
        &ContextorConfig::from_env()?,
    );
    let router = app(AppState::new(store, pipeline, llm), &api_cfg)?;

    let listener = tokio::net::TcpListener::bind(&api_cfg.address)
        .await
        .map_err(|source| AppError::Bind {
            addr: api_cfg.address.clone(),
            source,
        })?;
    info!(address = %api_cfg.address, "API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

/// Router with CORS, request tracing and the upload size limit applied.
///
/// # Errors
/// [`AppError::Config`] when a configured CORS origin is not a valid header value.
pub fn app(state: AppState, cfg: &ApiConfig) -> Result<Router, AppError> {
    let origins = cfg
        .cors_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| AppError::Config(format!("invalid CORS origin: {o}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/backends", get(backends))
        .route("/ingest", post(ingest))
        .route("/query", post(query))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state)))
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            // Without a signal handler the server runs until killed.
            warn!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
