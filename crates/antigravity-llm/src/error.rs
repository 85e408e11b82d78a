//! Error types for LLM backends.

use std::time::Duration;

use thiserror::Error;

/// Errors a backend call can produce.
///
/// These never reach the chat: [`crate::LlmAdapter`] folds them into an
/// [`crate::LlmOutcome`].
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend signalled throughput exhaustion (HTTP 429 or
    /// `RESOURCE_EXHAUSTED`).
    #[error("rate limited: {detail}")]
    RateLimited {
        /// Server-provided wait hint, if any.
        retry_after: Option<Duration>,
        /// Error body returned by the backend.
        detail: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The response body was not in the expected shape.
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// The backend could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::ResponseParse(e.to_string())
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
