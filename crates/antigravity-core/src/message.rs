//! Inbound chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A text message received from the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Raw message text.
    pub text: String,
    /// Display name of the sender.
    pub from: String,
    /// When the message arrived.
    pub received_at: DateTime<Utc>,
    /// Channel conversation identifier.
    pub chat_id: i64,
}

impl InboundMessage {
    /// Create a message stamped with the current time.
    pub fn new(chat_id: i64, from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from: from.into(),
            received_at: Utc::now(),
            chat_id,
        }
    }

    /// Override the arrival timestamp.
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}
