//! Error types for the connect crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Retry policy class for API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Errors that can occur while talking to the punch clock backend.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// HTTP client error (connection refused, DNS, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request did not complete before its deadline
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Every candidate base failed at the network level
    #[error("Service unavailable: no reachable endpoint after {attempts} attempts")]
    Unavailable { attempts: usize },

    /// API error response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ConnectError {
    /// Create a timeout error for `url`
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures that should move on to the next candidate base.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> ApiRetryClass {
        match self {
            Self::Api { status, .. } => classify_http_status(*status),
            Self::Http(_) | Self::Timeout { .. } | Self::Unavailable { .. } => {
                ApiRetryClass::Retryable
            }
            Self::Json(_) => ApiRetryClass::Permanent,
            Self::Auth(_) => ApiRetryClass::ReauthRequired,
        }
    }
}

/// Classify an HTTP status into retry behavior.
pub fn classify_http_status(status: u16) -> ApiRetryClass {
    match status {
        401 | 403 => ApiRetryClass::ReauthRequired,
        408 | 409 | 423 | 425 | 429 => ApiRetryClass::Retryable,
        500..=599 => ApiRetryClass::Retryable,
        _ => ApiRetryClass::Permanent,
    }
}
