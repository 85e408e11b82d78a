//! [`Channel`] implementation over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ParseMode};
use teloxide::RequestError;

use antigravity_core::{Channel, ChannelError, TextFormat};

/// Error text the Bot API returns for malformed markup.
const MARKUP_REJECTED: &str = "can't parse entities";

/// Sends bot output through a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<(), ChannelError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if format == TextFormat::Markdown {
            #[allow(deprecated)]
            let mode = ParseMode::Markdown;
            request = request.parse_mode(mode);
        }
        request.await.map(|_| ()).map_err(classify_error)
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), ChannelError> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(classify_error)
    }
}

fn classify_error(e: RequestError) -> ChannelError {
    let message = e.to_string();
    if is_markup_rejection(&message) {
        ChannelError::FormatRejected(message)
    } else {
        ChannelError::Transport(message)
    }
}

/// Whether a Bot API error means the message markup could not be parsed.
pub fn is_markup_rejection(message: &str) -> bool {
    message.to_lowercase().contains(MARKUP_REJECTED)
}
