//! Assistant-mode message routing.

use std::sync::Arc;

use tracing::{debug, info};

use antigravity_core::{
    deliver_with_fallback, detect_mode, split_chunks, Channel, ChannelError, InboundMessage,
    TextFormat, WorkMode, TELEGRAM_MAX_MESSAGE_LEN,
};
use antigravity_llm::LlmAdapter;

/// What the router sent back for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub mode: WorkMode,
    pub text: String,
    /// Format the channel finally accepted. `Plain` if any chunk fell back.
    pub format: TextFormat,
}

/// Classifies each message, asks the LLM and delivers the reply.
#[derive(Clone)]
pub struct MessageRouter {
    adapter: LlmAdapter,
    channel: Arc<dyn Channel>,
}

impl MessageRouter {
    pub fn new(adapter: LlmAdapter, channel: Arc<dyn Channel>) -> Self {
        Self { adapter, channel }
    }

    pub fn adapter(&self) -> &LlmAdapter {
        &self.adapter
    }

    /// Handle one inbound message end to end.
    ///
    /// LLM failures arrive as reply text; only delivery failures are errors.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<OutboundReply, ChannelError> {
        let mode = detect_mode(&msg.text);
        info!(
            chat_id = msg.chat_id,
            mode = %mode,
            preview = %preview(&msg.text),
            "Mode detected"
        );

        let channel = Arc::clone(&self.channel);
        let chat_id = msg.chat_id;
        tokio::spawn(async move {
            if let Err(e) = channel.send_typing(chat_id).await {
                debug!(chat_id, error = %e, "Typing indicator failed");
            }
        });

        let reply = self.adapter.ask(&msg.text, mode).await;
        let text = format_reply(mode, &reply);

        let mut format = TextFormat::Markdown;
        for chunk in split_chunks(&text, TELEGRAM_MAX_MESSAGE_LEN) {
            if deliver_with_fallback(self.channel.as_ref(), msg.chat_id, &chunk).await?
                == TextFormat::Plain
            {
                format = TextFormat::Plain;
            }
        }

        Ok(OutboundReply { mode, text, format })
    }
}

/// Prefix `reply` with the mode header, except in general mode.
pub fn format_reply(mode: WorkMode, reply: &str) -> String {
    match mode.header() {
        Some(header) => format!("{header}\n\n{reply}"),
        None => reply.to_string(),
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
