//! Shared LLM access for the RAG backend.
//!
//! The crate talks to a local Ollama server and exposes two logical profiles:
//!
//! - **chat** → grounded answer generation (`POST /api/chat`, non-streaming)
//! - **embedding** → batch embeddings (`POST /api/embed`)
//!
//! Construct [`service_profiles::LlmServiceProfiles`] once at startup, wrap it
//! in `Arc` and hand clones to the components that need it.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, HealthError};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::{ChatMessage, OllamaService};
