//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Engine/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The shared model handle could not be constructed (or has not been yet).
    #[error("model not ready: {0}")]
    ModelNotReady(String),

    /// Inference engine failed while generating.
    #[error("generation failed: {0}")]
    Generation(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Dispatch errors
    /// The work queue is at capacity; the submission was rejected.
    #[error("work queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("dispatcher is shut down")]
    DispatcherClosed,

    /// Unexpected failure inside an engine or other collaborator.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HuginnError {
    /// Whether the error is likely to clear up on its own (network hiccup,
    /// overloaded engine, rate limit).
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Http(_) | HuginnError::RateLimited { .. } => true,
            HuginnError::Api { status, .. } => *status >= 500,
            HuginnError::QueueFull { .. } => true,
            _ => false,
        }
    }
}

#[cfg(feature = "ollama")]
impl From<reqwest::Error> for HuginnError {
    fn from(err: reqwest::Error) -> Self {
        HuginnError::Http(err.to_string())
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
