//! Runtime configuration loaded from environment variables.

use std::str::FromStr;

use rag_store::DEFAULT_TOP_K;

use crate::error::ContextorError;

/// Retrieval knobs for the pipeline. All fields have defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextorConfig {
    /// Hits retrieved when a request does not say otherwise (`RAG_TOP_K`).
    pub top_k: usize,
    /// Minimum similarity a hit needs to reach the prompt (`RAG_SCORE_FLOOR`).
    /// Disabled by default: the model itself judges relevance.
    pub score_floor: Option<f32>,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            score_floor: None,
        }
    }
}

impl ContextorConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ContextorError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok())
    }

    /// Build through a variable lookup.
    ///
    /// # Example
    /// ```
    /// # use contextor::ContextorConfig;
    /// let cfg = ContextorConfig::from_lookup(&|k: &str| {
    ///     (k == "RAG_TOP_K").then(|| "8".to_string())
    /// })
    /// .unwrap();
    /// assert_eq!(cfg.top_k, 8);
    /// assert_eq!(cfg.score_floor, None);
    /// ```
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ContextorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let top_k = parse(lookup, "RAG_TOP_K")?.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be at least 1".into()));
        }
        let score_floor: Option<f32> = parse(lookup, "RAG_SCORE_FLOOR")?;
        if score_floor.is_some_and(|f| !f.is_finite()) {
            return Err(ContextorError::Config("RAG_SCORE_FLOOR must be finite".into()));
        }
        Ok(Self { top_k, score_floor })
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ContextorError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ContextorError::Config(format!("{key}: cannot parse '{v}'"))),
        None => Ok(None),
    }
}
