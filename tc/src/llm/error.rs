//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a model gateway call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::Auth { .. } => false,
            LlmError::InvalidResponse(_) => false,
            LlmError::Config(_) => false,
            LlmError::Json(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in session placeholders
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::RateLimited { .. } => "rate-limited",
            LlmError::Auth { .. } => "auth",
            LlmError::ApiError { .. } => "api",
            LlmError::Network(_) => "network",
            LlmError::InvalidResponse(_) => "malformed-response",
            LlmError::Timeout(_) => "timeout",
            LlmError::Config(_) => "config",
            LlmError::Json(_) => "malformed-response",
        }
    }
}
