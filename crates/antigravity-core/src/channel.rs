//! Outbound chat channel abstraction.
//!
//! Replies are sent with rich markup first. LLM output is untrusted and
//! regularly contains characters that break Telegram's Markdown parser, so
//! a rejected payload is resent unchanged as plain text.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chunk::{split_chunks, TELEGRAM_MAX_MESSAGE_LEN};

/// How a text payload should be rendered by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Lightweight markup (Telegram legacy Markdown).
    Markdown,
    /// No markup; sent verbatim.
    Plain,
}

/// Errors reported by a chat channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel could not parse the markup in the payload.
    #[error("markup rejected: {0}")]
    FormatRejected(String),

    /// Any other delivery failure.
    #[error("delivery failed: {0}")]
    Transport(String),
}

/// A destination for bot output.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send `text` to `chat_id` using `format`.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<(), ChannelError>;

    /// Show an ephemeral "typing" indicator.
    async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError>;
}

/// Send `text` as Markdown, falling back to plain text if the markup is rejected.
///
/// Returns the format that was finally accepted. Failures other than a
/// markup rejection are returned without a second attempt.
pub async fn deliver_with_fallback<C>(
    channel: &C,
    chat_id: i64,
    text: &str,
) -> Result<TextFormat, ChannelError>
where
    C: Channel + ?Sized,
{
    match channel.send_text(chat_id, text, TextFormat::Markdown).await {
        Ok(()) => Ok(TextFormat::Markdown),
        Err(ChannelError::FormatRejected(reason)) => {
            warn!(chat_id, reason = %reason, "Markdown rejected, resending as plain text");
            channel.send_text(chat_id, text, TextFormat::Plain).await?;
            Ok(TextFormat::Plain)
        }
        Err(e) => Err(e),
    }
}

/// Split `text` to the transport limit and deliver each chunk in order.
///
/// Stops at the first chunk that cannot be delivered.
pub async fn deliver_chunked<C>(channel: &C, chat_id: i64, text: &str) -> Result<usize, ChannelError>
where
    C: Channel + ?Sized,
{
    let chunks = split_chunks(text, TELEGRAM_MAX_MESSAGE_LEN);
    for (i, chunk) in chunks.iter().enumerate() {
        let format = deliver_with_fallback(channel, chat_id, chunk).await?;
        debug!(chat_id, chunk = i + 1, total = chunks.len(), ?format, "Chunk delivered");
    }
    Ok(chunks.len())
}

/// In-memory channel used by tests across the workspace.
#[cfg(any(test, feature = "test-util"))]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    /// A message captured by [`RecordingChannel`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Sent {
        pub chat_id: i64,
        pub text: String,
        pub format: TextFormat,
    }

    /// Channel that records every call and can be told to reject markup.
    #[derive(Debug, Default)]
    pub struct RecordingChannel {
        reject_markdown: bool,
        fail_all: bool,
        sent: Mutex<Vec<Sent>>,
        attempts: Mutex<Vec<Sent>>,
        typing: Mutex<Vec<i64>>,
    }

    impl RecordingChannel {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reject every Markdown payload as unparseable.
        pub fn rejecting_markdown() -> Self {
            Self {
                reject_markdown: true,
                ..Self::default()
            }
        }

        /// Fail every send with a transport error.
        pub fn failing() -> Self {
            Self {
                fail_all: true,
                ..Self::default()
            }
        }

        /// Messages that were accepted.
        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        /// Every send attempt, accepted or not.
        pub fn attempts(&self) -> Vec<Sent> {
            self.attempts.lock().map(|s| s.clone()).unwrap_or_default()
        }

        /// Chats that received a typing indicator.
        pub fn typing(&self) -> Vec<i64> {
            self.typing.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        async fn send_text(
            &self,
            chat_id: i64,
            text: &str,
            format: TextFormat,
        ) -> Result<(), ChannelError> {
            let record = Sent {
                chat_id,
                text: text.to_string(),
                format,
            };
            if let Ok(mut attempts) = self.attempts.lock() {
                attempts.push(record.clone());
            }
            if self.fail_all {
                return Err(ChannelError::Transport("network down".into()));
            }
            if self.reject_markdown && format == TextFormat::Markdown {
                return Err(ChannelError::FormatRejected(
                    "Bad Request: can't parse entities".into(),
                ));
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(record);
            }
            Ok(())
        }

        async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError> {
            if let Ok(mut typing) = self.typing.lock() {
                typing.push(chat_id);
            }
            if self.fail_all {
                return Err(ChannelError::Transport("network down".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingChannel;
    use super::*;

    #[tokio::test]
    async fn test_markdown_accepted_first_time() {
        let channel = RecordingChannel::new();
        let format = deliver_with_fallback(&channel, 7, "*bold*").await.unwrap();

        assert_eq!(format, TextFormat::Markdown);
        assert_eq!(channel.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_markdown_is_resent_as_identical_plain_text() {
        let channel = RecordingChannel::rejecting_markdown();
        let text = "snake_case and [unclosed *markup";
        let format = deliver_with_fallback(&channel, 7, text).await.unwrap();

        assert_eq!(format, TextFormat::Plain);
        let attempts = channel.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].format, TextFormat::Markdown);
        assert_eq!(attempts[1].format, TextFormat::Plain);
        assert_eq!(attempts[0].text, attempts[1].text);
        assert_eq!(channel.sent()[0].text, text);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let channel = RecordingChannel::failing();
        let result = deliver_with_fallback(&channel, 7, "hi").await;

        assert!(matches!(result, Err(ChannelError::Transport(_))));
        assert_eq!(channel.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_chunked_delivery_preserves_order() {
        let channel = RecordingChannel::new();
        let text = "a".repeat(TELEGRAM_MAX_MESSAGE_LEN + 10);
        let count = deliver_chunked(&channel, 1, &text).await.unwrap();

        assert_eq!(count, 2);
        let sent = channel.sent();
        assert_eq!(sent[0].text.chars().count(), TELEGRAM_MAX_MESSAGE_LEN);
        assert_eq!(sent[1].text, "a".repeat(10));
    }
}
