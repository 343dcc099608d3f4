//! Muninn error types

use std::time::Duration;

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Request validation errors
    #[error("Missing required parameters: period, hotel, room")]
    MissingParameters,

    #[error("Invalid {name}. Must be one of: {}", allowed.join(", "))]
    InvalidParameter {
        name: &'static str,
        allowed: Vec<String>,
    },

    // Oracle/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{status} {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The oracle answered, but the identifier that triggered the lookup is
    /// not among the returned rates. Nothing from such a response is cached.
    #[error("requested ID is missing from response body")]
    InvalidResponse,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("store error: {0}")]
    Store(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MuninnError {
    /// Whether retrying the same oracle call might succeed.
    ///
    /// Transport failures, timeouts, rate limits and 5xx answers are
    /// transient. Validation, integrity and configuration errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            MuninnError::Http(_) | MuninnError::Timeout(_) | MuninnError::RateLimited { .. } => {
                true
            }
            MuninnError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-provided backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MuninnError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the error was caused by the caller's request rather than by
    /// the oracle or the cache.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MuninnError::MissingParameters | MuninnError::InvalidParameter { .. }
        )
    }
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
