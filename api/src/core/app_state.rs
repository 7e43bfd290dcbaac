use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::RagPipeline;
use rag_store::RagStore;

/// Shared state for all HTTP handlers.
///
/// Built once at startup; every field is a cheap handle to a long-lived service.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion entry point (loader, chunker, embedder, index).
    pub store: Arc<RagStore>,
    /// Retrieve-then-generate pipeline over the same collection.
    pub pipeline: Arc<RagPipeline>,
    /// LLM profiles, used here for backend health probes.
    pub llm: Arc<LlmServiceProfiles>,
}

impl AppState {
    pub fn new(store: Arc<RagStore>, pipeline: RagPipeline, llm: Arc<LlmServiceProfiles>) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
            llm,
        }
    }
}
