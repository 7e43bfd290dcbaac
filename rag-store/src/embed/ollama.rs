//! Ollama embedding provider implementation.
//!
//! Sends one batched `POST /api/embed` per call through the shared
//! [`LlmServiceProfiles`] embedding profile.

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::{debug, error};

use super::{EmbedFuture, EmbeddingsProvider, check_dimension};
use crate::errors::RagError;

/// Configuration for the Ollama embedding backend.
#[derive(Clone)]
pub struct OllamaConfig {
    pub svc: Arc<LlmServiceProfiles>,
    /// Expected embedding dimension size.
    pub dim: usize,
    /// Instruction prepended to queries (asymmetric models such as e5/bge).
    pub query_prefix: Option<String>,
}

/// Ollama embedding provider (async).
#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: usize,
    query_prefix: Option<String>,
}

impl OllamaEmbedder {
    /// Construct a new embedder from configuration.
    pub fn new(cfg: OllamaConfig) -> Self {
        Self {
            svc: cfg.svc,
            dim: cfg.dim,
            query_prefix: cfg.query_prefix,
        }
    }

    /// Embeds the non-blank texts in one request; blank slots get zero vectors.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut out = vec![vec![0.0f32; self.dim]; texts.len()];
        let (slots, inputs): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .unzip();

        if inputs.is_empty() {
            debug!(count = texts.len(), "all inputs blank; returning zero vectors");
            return Ok(out);
        }

        let vectors = self.svc.embed(&inputs).await.map_err(|e| {
            error!(error = %e, batch = inputs.len(), "ollama embedding request failed");
            RagError::from(e)
        })?;
        if vectors.len() != inputs.len() {
            return Err(RagError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }

        for (slot, vector) in slots.into_iter().zip(vectors) {
            check_dimension(&vector, self.dim)?;
            out[slot] = vector;
        }
        debug!(count = texts.len(), dim = self.dim, "batch embedded");
        Ok(out)
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn embed_documents<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(self.embed_batch(texts))
    }

    fn embed_query<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Ok(vec![0.0; self.dim]);
            }
            let input = match &self.query_prefix {
                Some(prefix) => format!("{prefix}{text}"),
                None => text.to_string(),
            };
            let mut vectors = self.embed_batch(std::slice::from_ref(&input)).await?;
            vectors
                .pop()
                .ok_or_else(|| RagError::Embedding("empty embedding response".into()))
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{LlmModelConfig, LlmProvider};
    use axum::{Json, Router, routing::post};
    use serde_json::{Value, json};

    /// Fake `/api/embed`: vector = [len(input), 1, 0] per input, so order is observable.
    async fn serve_fake_ollama() -> String {
        let app = Router::new().route(
            "/api/embed",
            post(|Json(body): Json<Value>| async move {
                let inputs = body["input"].as_array().cloned().unwrap_or_default();
                let embeddings: Vec<Vec<f32>> = inputs
                    .iter()
                    .map(|s| vec![s.as_str().unwrap_or("").len() as f32, 1.0, 0.0])
                    .collect();
                Json(json!({ "model": body["model"], "embeddings": embeddings }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn embedder(endpoint: String, dim: usize, prefix: Option<&str>) -> OllamaEmbedder {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "all-minilm".into(),
            endpoint,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
        };
        let svc = LlmServiceProfiles::new(cfg.clone(), cfg, Some(5)).unwrap();
        OllamaEmbedder::new(OllamaConfig {
            svc: Arc::new(svc),
            dim,
            query_prefix: prefix.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn preserves_order_and_zero_fills_blanks() {
        let e = embedder(serve_fake_ollama().await, 3, None);
        let texts = vec!["abc".to_string(), "  ".to_string(), "a".to_string()];
        let out = e.embed_documents(&texts).await.unwrap();
        assert_eq!(out, vec![vec![3.0, 1.0, 0.0], vec![0.0; 3], vec![1.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn query_prefix_applies_to_queries_only() {
        let e = embedder(serve_fake_ollama().await, 3, Some("query: "));
        let q = e.embed_query("abc").await.unwrap();
        assert_eq!(q[0], "query: abc".len() as f32);
        let d = e.embed_documents(&["abc".to_string()]).await.unwrap();
        assert_eq!(d[0][0], 3.0);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_reported() {
        let e = embedder(serve_fake_ollama().await, 384, None);
        let err = e.embed_query("hello").await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 3, want: 384 }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_embedding_error() {
        let e = embedder("http://127.0.0.1:9".into(), 3, None);
        let err = e.embed_query("hello").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }
}
