//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once at startup, wrap in `Arc`, and pass clones to dependents.
//! - Both HTTP clients are built eagerly, so configuration problems surface
//!   before the first request instead of in the middle of one.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(LlmServiceProfiles::from_env()?);
//!
//!     let txt = svc.chat("Answer briefly.", "What is Rust?").await?;
//!     println!("CHAT: {txt}");
//!
//!     let emb = svc.embed(&["Ferris".to_string()]).await?;
//!     println!("Embedding dim = {}", emb[0].len());
//!
//!     println!("Health = {:?}", svc.health_all().await);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{
        default_config::{config_ollama_chat, config_ollama_embedding, env_lookup},
        llm_model_config::LlmModelConfig,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::ollama_service::{ChatMessage, OllamaService},
};

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: Arc<OllamaService>,
    embedding: Arc<OllamaService>,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles.
    ///
    /// - `chat`: profile used for answer generation.
    /// - `embedding`: profile used for chunk and query embeddings.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        info!(
            chat_model = %chat.model,
            embedding_model = %embedding.model,
            endpoint = %chat.endpoint,
            "LLM service profiles initialized"
        );
        Ok(Self {
            chat: Arc::new(OllamaService::new(chat)?),
            embedding: Arc::new(OllamaService::new(embedding)?),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles from environment variables.
    ///
    /// See [`crate::config::default_config`] for the variables read.
    pub fn from_env() -> Result<Self, AiLlmError> {
        Self::from_lookup(&env_lookup)
    }

    /// Builds both profiles through a custom variable lookup.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, AiLlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            config_ollama_chat(lookup)?,
            config_ollama_embedding(lookup)?,
            None,
        )
    }

    /// Sends a `(system, user)` prompt pair using the **chat** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the request fails, times out or cannot be decoded.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AiLlmError> {
        self.chat
            .chat(&[ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }

    /// Computes embeddings for a batch using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        self.embedding.embed(inputs).await
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// If the embedding profile equals the chat profile, it is checked only once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let (chat, embedding) = self.profiles();
        let mut list = vec![chat.clone()];
        if embedding != chat {
            list.push(embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.chat.config(), self.embedding.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn builds_profiles_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OLLAMA_URL", "http://127.0.0.1:11434"),
            ("OLLAMA_MODEL", "llama3.1:8b"),
            ("EMBEDDING_MODEL", "nomic-embed-text"),
        ]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());
        let svc = LlmServiceProfiles::from_lookup(&lookup).unwrap();
        let (chat, embedding) = svc.profiles();
        assert_eq!(chat.model, "llama3.1:8b");
        assert_eq!(embedding.model, "nomic-embed-text");
        assert_eq!(chat.endpoint, embedding.endpoint);
    }
}
