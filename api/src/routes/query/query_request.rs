use contextor::PipelineResult;
use rag_store::RetrievedContext;
use serde::{Deserialize, Serialize};

/// Request payload for /query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Natural language question.
    pub query: String,
    /// Optional override of the configured number of retrieved chunks.
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Response payload for /query.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    /// Final model answer, or `Error generating answer: ...` when the LLM failed.
    pub answer: String,
    /// Chunks given to the model, best first.
    pub context: Vec<RetrievedContext>,
}

impl From<PipelineResult> for QueryResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            answer: result.answer.answer_text(),
            query: result.query,
            context: result.retrieved_context,
        }
    }
}
