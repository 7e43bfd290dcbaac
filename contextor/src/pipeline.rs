//! Retrieve-then-generate pipeline.

use rag_store::{RetrievedContext, Retriever};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cfg::ContextorConfig;
use crate::error::ContextorError;
use crate::generator::{GenerationOutcome, Generator};

/// Everything produced for one query.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineResult {
    pub query: String,
    pub answer: GenerationOutcome,
    pub retrieved_context: Vec<RetrievedContext>,
}

/// Single-pass pipeline: no retries, no caching.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: Retriever,
    generator: Generator,
    default_top_k: usize,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, generator: Generator, cfg: &ContextorConfig) -> Self {
        Self {
            retriever: retriever.with_score_floor(cfg.score_floor),
            generator,
            default_top_k: cfg.top_k,
        }
    }

    /// Runs the pipeline with the configured `top_k`.
    pub async fn run(&self, query: &str) -> Result<PipelineResult, ContextorError> {
        self.run_with_top_k(query, None).await
    }

    /// Retrieves context, then generates the answer.
    ///
    /// # Errors
    /// - [`ContextorError::InvalidInput`] for a blank query
    /// - [`ContextorError::Rag`] when retrieval fails (including `top_k == 0`)
    ///
    /// Generation failures are reported inside [`PipelineResult::answer`].
    #[instrument(skip(self), fields(collection = %self.retriever.collection()))]
    pub async fn run_with_top_k(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<PipelineResult, ContextorError> {
        if query.trim().is_empty() {
            return Err(ContextorError::InvalidInput("query must not be empty".into()));
        }
        let top_k = top_k.unwrap_or(self.default_top_k);

        let retrieved_context = self.retriever.retrieve(query, top_k).await?;
        debug!(hits = retrieved_context.len(), top_k, "context retrieved");

        let answer = self
            .generator
            .generate_answer(query, &retrieved_context)
            .await;
        info!(
            hits = retrieved_context.len(),
            success = answer.is_success(),
            "query answered"
        );

        Ok(PipelineResult {
            query: query.to_string(),
            answer,
            retrieved_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatFuture, ChatModel};
    use crate::prompt::NO_CONTEXT_MARKER;
    use ai_llm_service::AiLlmError;
    use ai_llm_service::error_handler::{HttpError, StatusCode};
    use rag_store::{Document, HashEmbedder, InMemoryIndex, RagConfig, RagError, RagStore};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// Echoes whether the prompt contained the no-context marker.
    struct Scripted {
        fail: bool,
        last_user: Mutex<Option<String>>,
    }

    impl Scripted {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                last_user: Mutex::new(None),
            })
        }
    }

    impl ChatModel for Scripted {
        fn complete<'a>(&'a self, _system: &'a str, user: &'a str) -> ChatFuture<'a> {
            *self.last_user.lock().unwrap() = Some(user.to_string());
            let reply = if self.fail {
                Err(AiLlmError::HttpStatus(HttpError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    url: "http://localhost:11434/api/chat".into(),
                    snippet: "model is loading".into(),
                }))
            } else if user.contains(NO_CONTEXT_MARKER) {
                Ok("General knowledge (no documents used): not sure.".to_string())
            } else {
                Ok("It is a gateway timeout. [Source: errors.txt]".to_string())
            };
            Box::pin(async move { reply })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    async fn store_with(docs: &[Document]) -> RagStore {
        let mut cfg = RagConfig::new_default("http://localhost:6334", "enterprise_rag");
        cfg.embedding_dim = 256;
        let store = RagStore::new(
            cfg,
            Arc::new(HashEmbedder::new(256).unwrap()),
            Arc::new(InMemoryIndex::new()),
        )
        .unwrap();
        store.ensure_collection().await.unwrap();
        store.ingest_documents(docs).await.unwrap();
        store
    }

    fn pipeline(store: &RagStore, chat: Arc<Scripted>) -> RagPipeline {
        RagPipeline::new(
            store.retriever(),
            Generator::new(chat),
            &ContextorConfig::default(),
        )
    }

    fn doc(source: &str, content: &str) -> Document {
        let mut meta = BTreeMap::new();
        meta.insert("source".to_string(), serde_json::json!(source));
        Document::with_metadata(content, meta)
    }

    #[tokio::test]
    async fn answers_from_the_matching_document() {
        let store = store_with(&[
            doc("errors.txt", "Error 504 means the upstream gateway timed out."),
            doc("menu.txt", "The cafeteria serves soup on Fridays."),
        ])
        .await;
        let chat = Scripted::new(false);
        let result = pipeline(&store, chat.clone())
            .run("What does Error 504 mean?")
            .await
            .unwrap();

        assert_eq!(result.query, "What does Error 504 mean?");
        assert_eq!(result.retrieved_context[0].source, "errors.txt");
        assert_eq!(
            result.answer,
            GenerationOutcome::Success("It is a gateway timeout. [Source: errors.txt]".into())
        );
        let prompt = chat.last_user.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Source: errors.txt"));
    }

    #[tokio::test]
    async fn empty_index_still_answers_without_sources() {
        let store = store_with(&[]).await;
        let result = pipeline(&store, Scripted::new(false))
            .run("Who founded the company?")
            .await
            .unwrap();
        assert!(result.retrieved_context.is_empty());
        assert!(!result.answer.answer_text().contains("[Source:"));
    }

    #[tokio::test]
    async fn backend_failure_keeps_context() {
        let store = store_with(&[doc("errors.txt", "Error 504 means gateway timeout.")]).await;
        let result = pipeline(&store, Scripted::new(true))
            .run("Error 504?")
            .await
            .unwrap();
        assert_eq!(result.retrieved_context.len(), 1);
        let text = result.answer.answer_text();
        assert!(text.starts_with("Error generating answer: "));
        assert!(text.contains("503"));
    }

    #[tokio::test]
    async fn invalid_requests_fail_fast() {
        let store = store_with(&[]).await;
        let p = pipeline(&store, Scripted::new(false));
        assert!(matches!(p.run("   ").await, Err(ContextorError::InvalidInput(_))));
        assert!(matches!(
            p.run_with_top_k("hello", Some(0)).await,
            Err(ContextorError::Rag(RagError::InvalidInput(_)))
        ));
    }
}
