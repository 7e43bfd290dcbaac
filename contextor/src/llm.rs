//! Chat backend seam used by the generator.

use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, LlmServiceProfiles};

/// Boxed future returned by [`ChatModel::complete`].
pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Non-streaming chat completion over a `(system, user)` prompt pair.
///
/// Implemented by [`LlmServiceProfiles`] (Ollama `POST /api/chat` with the
/// chat profile's temperature and timeout); tests plug in scripted models.
pub trait ChatModel: Send + Sync {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

impl ChatModel for LlmServiceProfiles {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a> {
        Box::pin(self.chat(system, user))
    }

    fn model_name(&self) -> &str {
        &self.profiles().0.model
    }
}
