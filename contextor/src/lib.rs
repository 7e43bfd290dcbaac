//! Grounded answer generation on top of `rag-store` retrieval.
//!
//! [`RagPipeline::run`] embeds the question, retrieves top-K context, builds a
//! prompt that carries the grounding policy, calls the chat model and returns
//! the answer together with the context it was given. A failing chat backend
//! yields [`GenerationOutcome::BackendError`] instead of an error, so callers
//! still see what was retrieved.
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # use ai_llm_service::LlmServiceProfiles;
//! # use contextor::{ContextorConfig, Generator, RagPipeline};
//! # use rag_store::{RagConfig, RagStore};
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(LlmServiceProfiles::from_env()?);
//! let store = RagStore::from_config(RagConfig::from_env()?, llm.clone())?;
//! let cfg = ContextorConfig::from_env()?;
//! let pipeline = RagPipeline::new(store.retriever(), Generator::new(llm), &cfg);
//!
//! let result = pipeline.run("What does Error 504 mean?").await?;
//! println!("{}", result.answer.answer_text());
//! # Ok(()) }
//! ```

pub mod cfg;
mod error;
pub mod generator;
pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use generator::{GenerationOutcome, Generator};
pub use llm::ChatModel;
pub use pipeline::{PipelineResult, RagPipeline};
