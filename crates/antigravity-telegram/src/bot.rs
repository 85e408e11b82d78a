//! Main Telegram bot implementation.

use std::convert::Infallible;
use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use tokio::sync::watch;
use tracing::{info, warn};

use antigravity_bridge::BridgePoller;
use antigravity_core::Settings;

use crate::channel::TelegramChannel;
use crate::error::Result;
use crate::handlers::{handle_command, handle_message, handle_unknown_command, Command};
use crate::state::BotState;

/// The Antigravity Telegram bot.
pub struct AntigravityBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Outbound channel over `bot`.
    channel: Arc<TelegramChannel>,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl AntigravityBot {
    /// Create the bot for the given settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let bot = Bot::new(settings.telegram_token.clone());
        let channel = Arc::new(TelegramChannel::new(bot.clone()));
        let state = Arc::new(BotState::new(settings, channel.clone())?);

        Ok(Self {
            bot,
            channel,
            state,
        })
    }

    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self.bot.get_me().await?;
        Ok(me.username().to_string())
    }

    /// Run in long-polling mode until Ctrl+C.
    ///
    /// In bridge mode the outbox poller runs alongside the dispatcher and is
    /// stopped once the dispatcher returns.
    pub async fn start_polling(&self) -> Result<()> {
        info!(mode = %self.state.settings().bot_mode, "Starting Telegram bot in polling mode...");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = self.state.bridge_queue().map(|queue| {
            let mut poller = BridgePoller::new(queue.clone(), self.channel.clone(), shutdown_rx);
            tokio::spawn(async move { poller.run().await })
        });

        let state_for_commands = Arc::clone(&self.state);
        let state_for_unknown = Arc::clone(&self.state);
        let state_for_messages = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(state, msg, cmd).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.text().is_some_and(|t| t.starts_with('/')))
                    .endpoint(move |msg: Message| {
                        let state = Arc::clone(&state_for_unknown);
                        async move { handle_unknown_command(state, msg).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.text().is_some())
                    .endpoint(move |msg: Message| {
                        let state = Arc::clone(&state_for_messages);
                        async move { handle_message(state, msg).await }
                    }),
            );

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(self.bot.clone(), handler)
            .distribution_function(concurrent_updates)
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.kind);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "Error while handling an update",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        if let Some(handle) = poller {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                warn!(error = %e, "Bridge poller task failed");
            }
        }

        info!("Bot stopped");
        Ok(())
    }
}

/// One worker per update; updates from the same chat are not queued behind
/// each other.
fn concurrent_updates(_update: &Update) -> Option<Infallible> {
    None
}
