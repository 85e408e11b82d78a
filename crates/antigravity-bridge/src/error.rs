//! Error types for the bridge crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the bridge queue.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A queue directory could not be created or listed.
    #[error("failed to access directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queue file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queue file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An inbox record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The recipient record does not hold a chat id.
    #[error("invalid recipient record {path}: {value:?}")]
    InvalidRecipient { path: PathBuf, value: String },

    /// Delivering an outbox record failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] antigravity_core::ChannelError),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
