//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Invalid or missing configuration.
    #[error(transparent)]
    Config(#[from] antigravity_core::ConfigError),

    /// The LLM backend could not be set up.
    #[error("LLM backend error: {0}")]
    Backend(#[from] antigravity_llm::BackendError),

    /// The bridge queue could not be read or written.
    #[error("Bridge error: {0}")]
    Bridge(#[from] antigravity_bridge::BridgeError),

    /// A reply could not be delivered.
    #[error("Channel error: {0}")]
    Channel(#[from] antigravity_core::ChannelError),

    /// A Bot API call failed.
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
