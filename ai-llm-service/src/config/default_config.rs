//! Default LLM configs loaded from environment variables.
//!
//! Two roles are configured, both on Ollama:
//!
//! - **Chat** → grounded answer generation
//! - **Embedding** → embedding generator for chunks and queries
//!
//! Every constructor takes a `lookup` function so that callers (and tests) can
//! provide variables without touching the process environment. Use
//! [`env_lookup`] for the real environment.
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = chat model (default `qwen2.5:7b-instruct-q4_k_m`)
//! - `LLM_TEMPERATURE`             = chat temperature (default `0.1`)
//! - `LLM_MAX_TOKENS`              = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`            = chat request timeout (default `120`)
//! - `EMBEDDING_MODEL`             = embedding model (default `all-minilm`)
//! - `EMBEDDING_TIMEOUT_SECS`      = embedding request timeout (default `30`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, opt_number, opt_var, validate_http_endpoint, validate_range_f32,
    },
};

/// Default chat model; a small instruct model keeps answers fast on CPU.
pub const DEFAULT_CHAT_MODEL: &str = "qwen2.5:7b-instruct-q4_k_m";
/// Default embedding model (384-dimensional output).
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
/// Low temperature favours factual, repeatable answers.
pub const DEFAULT_CHAT_TEMPERATURE: f32 = 0.1;

/// Reads variables from the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
///
/// # Errors
///
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
/// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
fn ollama_endpoint<F>(lookup: &F) -> Result<String, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = opt_var(lookup, "OLLAMA_URL") {
        let url = url.trim().to_string();
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_var(lookup, "OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Ok("http://localhost:11434".to_string())
}

/// Constructs the config for the **chat** model used by answer generation.
///
/// # Defaults
/// - `temperature = Some(0.1)`
/// - `timeout_secs = Some(120)`
pub fn config_ollama_chat<F>(lookup: &F) -> Result<LlmModelConfig, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint = ollama_endpoint(lookup)?;
    let model = opt_var(lookup, "OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
    let max_tokens = opt_number(lookup, "LLM_MAX_TOKENS", "expected u32")?;
    let temperature = opt_number(lookup, "LLM_TEMPERATURE", "expected f32")?
        .unwrap_or(DEFAULT_CHAT_TEMPERATURE);
    validate_range_f32(
        "temperature",
        "expected 0.0..=2.0",
        temperature,
        0.0,
        2.0,
    )?;
    let timeout_secs = opt_number(lookup, "LLM_TIMEOUT_SECS", "expected u64")?.unwrap_or(120);

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_ollama_embedding<F>(lookup: &F) -> Result<LlmModelConfig, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint = ollama_endpoint(lookup)?;
    let model = opt_var(lookup, "EMBEDDING_MODEL")
        .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
    let timeout_secs =
        opt_number(lookup, "EMBEDDING_TIMEOUT_SECS", "expected u64")?.unwrap_or(30);

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}
