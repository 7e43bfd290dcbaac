//! Grounded answer generation.

use std::sync::Arc;
use std::time::Instant;

use rag_store::RetrievedContext;
use serde::Serialize;
use tracing::{info, warn};

use crate::llm::ChatModel;
use crate::prompt::{SYSTEM_PROMPT, build_user_prompt};

/// Result of one generation attempt. Backend failures are values, not errors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success(String),
    BackendError(String),
}

impl GenerationOutcome {
    /// Text shown to users; failures render as `Error generating answer: <message>`.
    pub fn answer_text(&self) -> String {
        match self {
            Self::Success(text) => text.clone(),
            Self::BackendError(msg) => format!("Error generating answer: {msg}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Turns a query plus retrieved context into an answer through a [`ChatModel`].
#[derive(Clone)]
pub struct Generator {
    chat: Arc<dyn ChatModel>,
}

impl Generator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Never fails: transport errors, non-2xx statuses, decode failures and
    /// timeouts all become [`GenerationOutcome::BackendError`].
    pub async fn generate_answer(
        &self,
        query: &str,
        context: &[RetrievedContext],
    ) -> GenerationOutcome {
        let user = build_user_prompt(query, context);
        let started = Instant::now();

        match self.chat.complete(SYSTEM_PROMPT, &user).await {
            Ok(text) => {
                info!(
                    model = self.chat.model_name(),
                    context = context.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "answer generated"
                );
                GenerationOutcome::Success(text)
            }
            Err(err) => {
                warn!(
                    model = self.chat.model_name(),
                    error = %err,
                    "chat backend failed; returning in-band error"
                );
                GenerationOutcome::BackendError(err.to_string())
            }
        }
    }
}
