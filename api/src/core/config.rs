//! HTTP server settings read from environment variables.

use ai_llm_service::{
    AiLlmError,
    error_handler::{opt_number, opt_var},
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Listener address, allowed CORS origins and upload size limit.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    /// `API_ADDRESS`, e.g. `0.0.0.0:8000`.
    pub address: String,
    /// `CORS_ALLOW_ORIGINS`, comma separated.
    pub cors_origins: Vec<String>,
    /// `MAX_UPLOAD_MB`, converted to bytes.
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AiLlmError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, AiLlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = opt_var(lookup, "API_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.into());
        let origins =
            opt_var(lookup, "CORS_ALLOW_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.into());
        let max_upload_mb: usize =
            opt_number(lookup, "MAX_UPLOAD_MB", "expected usize")?.unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        Ok(Self {
            address,
            cors_origins: origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        })
    }
}
