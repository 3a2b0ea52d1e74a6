//! Error taxonomy for the knowledge and conversation pipelines.
//!
//! [`GatewayError`] covers failed model calls (embedding or generation).
//! [`LoreError`] is what library operations return; callers decide whether a
//! gateway failure is fatal or should fall back to a safe default.

use thiserror::Error;

/// A remote model call failed.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum LoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Caller-supplied arguments violate a precondition. Never silently corrected.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, LoreError>;
