//! Shared state for the bot's handlers.

use std::sync::Arc;

use tracing::info;

use antigravity_bridge::{BridgeConfig, BridgeQueue};
use antigravity_core::{BotMode, Channel, Settings};
use antigravity_llm::LlmAdapter;

use crate::error::Result;
use crate::router::MessageRouter;

/// How ordinary (non-command) messages are answered.
#[derive(Clone)]
pub enum TextHandler {
    /// Reply with the message text.
    Echo,
    /// Classify, ask the LLM and reply.
    Assistant(MessageRouter),
    /// Queue the message for the relay process.
    Bridge(BridgeQueue),
}

impl TextHandler {
    pub fn bot_mode(&self) -> BotMode {
        match self {
            Self::Echo => BotMode::Echo,
            Self::Assistant(_) => BotMode::Assistant,
            Self::Bridge(_) => BotMode::Bridge,
        }
    }
}

/// State shared by every update handler. Read-only after startup.
pub struct BotState {
    settings: Settings,
    channel: Arc<dyn Channel>,
    text_handler: TextHandler,
}

impl BotState {
    /// Build the state for the configured bot mode.
    pub fn new(settings: Settings, channel: Arc<dyn Channel>) -> Result<Self> {
        let text_handler = match settings.bot_mode {
            BotMode::Echo => TextHandler::Echo,
            BotMode::Assistant => {
                let adapter = LlmAdapter::from_settings(&settings)?;
                adapter.log_startup();
                TextHandler::Assistant(MessageRouter::new(adapter, Arc::clone(&channel)))
            }
            BotMode::Bridge => {
                let queue = BridgeQueue::new(BridgeConfig::new(&settings.bridge_dir));
                queue.ensure_dirs()?;
                info!(root = %settings.bridge_dir.display(), "Bridge queue ready");
                TextHandler::Bridge(queue)
            }
        };

        Ok(Self::with_handler(settings, channel, text_handler))
    }

    /// Build the state around an already constructed handler.
    pub fn with_handler(
        settings: Settings,
        channel: Arc<dyn Channel>,
        text_handler: TextHandler,
    ) -> Self {
        Self {
            settings,
            channel,
            text_handler,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn text_handler(&self) -> &TextHandler {
        &self.text_handler
    }

    /// The bridge queue, in bridge mode.
    pub fn bridge_queue(&self) -> Option<&BridgeQueue> {
        match &self.text_handler {
            TextHandler::Bridge(queue) => Some(queue),
            _ => None,
        }
    }
}
