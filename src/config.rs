//! Client construction-time configuration.
//!
//! Configuration can also be loaded from environment variables:
//! - `TASKWIRE_API_URL` - Required. Base URL of the task service.
//! - `TASKWIRE_TOKEN` - Optional. Bearer token for protected endpoints.
//! - `TASKWIRE_TIMEOUT_SECS` - Optional. Per-attempt timeout. Defaults to `30`.
//! - `TASKWIRE_MAX_RETRIES` - Optional. Retries after the initial attempt. Defaults to `3`.
//! - `TASKWIRE_RETRY_BACKOFF` - Optional. Backoff multiplier in seconds. Defaults to `1.0`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL is required")]
    MissingBaseUrl,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("bearer token is not a valid HTTP header value")]
    InvalidToken,

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("failed to initialize HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Construction-time settings for [`crate::TaskClient`].
///
/// Everything except the base URL is optional; unset fields keep the
/// defaults below. All settings are fixed once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task service (e.g. `http://localhost:3000/api/v1`)
    pub base_url: String,
    /// Bearer token attached to every request when set
    pub token: Option<String>,
    /// Timeout applied to each HTTP attempt; retries get a fresh budget
    pub timeout: Duration,
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Exponential backoff multiplier in seconds
    pub retry_backoff: f64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: 1.0,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: f64) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TASKWIRE_API_URL` is not set,
    /// or `ConfigError::InvalidValue` for unparseable numeric settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("TASKWIRE_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("TASKWIRE_API_URL".to_string()))?;

        let token = std::env::var("TASKWIRE_TOKEN").ok();

        let timeout = match std::env::var("TASKWIRE_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|e| {
                ConfigError::InvalidValue("TASKWIRE_TIMEOUT_SECS".to_string(), format!("{e}"))
            })?),
            Err(_) => Duration::from_secs(30),
        };

        let max_retries = match std::env::var("TASKWIRE_MAX_RETRIES") {
            Ok(raw) => raw.parse().map_err(|e| {
                ConfigError::InvalidValue("TASKWIRE_MAX_RETRIES".to_string(), format!("{e}"))
            })?,
            Err(_) => 3,
        };

        let retry_backoff = match std::env::var("TASKWIRE_RETRY_BACKOFF") {
            Ok(raw) => raw.parse().map_err(|e| {
                ConfigError::InvalidValue("TASKWIRE_RETRY_BACKOFF".to_string(), format!("{e}"))
            })?,
            Err(_) => 1.0,
        };

        Ok(Self {
            base_url,
            token,
            timeout,
            max_retries,
            retry_backoff,
        })
    }
}
