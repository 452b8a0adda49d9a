//! Error types for the punch clock core crate.

use thiserror::Error;

/// Result type alias for persistent store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`crate::store::KeyValueStore`] backend.
///
/// Callers in this crate treat every variant as non-fatal: reads fall back to
/// a default value and failed writes are logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error (missing permissions, disk full, ...)
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized or deserialized
    #[error("Storage serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend refused the operation (disabled, quota exceeded)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an unavailable-storage error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
