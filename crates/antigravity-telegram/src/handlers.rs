//! Command and message handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use antigravity_core::{deliver_chunked, InboundMessage, TextFormat, MODE_RULES};

use crate::error::Result;
use crate::exec::{self, SHELL_TIMEOUT};
use crate::state::{BotState, TextHandler};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Wake up the bot")]
    Start,

    #[command(description = "Show this help")]
    Help,

    #[command(description = "Show the current backend")]
    Mode,

    #[command(description = "Run a shell command: /run <command>")]
    Run(String),

    #[command(description = "List files: /ls [path]")]
    Ls(String),

    #[command(description = "Show a file: /cat <path>")]
    Cat(String),
}

/// Teloxide endpoint for parsed commands.
pub async fn handle_command(state: Arc<BotState>, msg: Message, cmd: Command) -> Result<()> {
    info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
    dispatch_command(&state, msg.chat.id.0, cmd).await
}

/// Teloxide endpoint for text that starts with / but is not a known command.
pub async fn handle_unknown_command(state: Arc<BotState>, msg: Message) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let name = text.split_whitespace().next().unwrap_or(text);
    info!(chat_id = %msg.chat.id, cmd = %name, "Unrecognized command");

    state
        .channel()
        .send_text(
            msg.chat.id.0,
            &format!("Unknown command: {name}\n\nUse /help to see available commands."),
            TextFormat::Plain,
        )
        .await?;
    Ok(())
}

/// Teloxide endpoint for ordinary text messages.
pub async fn handle_message(state: Arc<BotState>, msg: Message) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let from = msg
        .from
        .as_ref()
        .map(|u| u.full_name())
        .unwrap_or_default();
    let inbound = InboundMessage::new(msg.chat.id.0, from, text).with_received_at(msg.date);

    handle_text(&state, &inbound).await
}

/// Answer a command.
pub async fn dispatch_command(state: &BotState, chat_id: i64, cmd: Command) -> Result<()> {
    let text = match cmd {
        Command::Start => start_text(state.text_handler()),
        Command::Help => help_text(),
        Command::Mode => mode_text(state),
        Command::Run(command) => {
            if let Some(denied) = check_exec_allowed(state, chat_id) {
                denied
            } else if command.trim().is_empty() {
                "Usage: `/run <command>`\nExample: `/run ls -la`".to_string()
            } else {
                let command = command.trim();
                reply(state, chat_id, &format!("⏳ Running: `{command}`")).await?;
                exec::run_shell(command, &state.settings().work_dir, SHELL_TIMEOUT).await
            }
        }
        Command::Ls(path) => match check_exec_allowed(state, chat_id) {
            Some(denied) => denied,
            None => exec::list_dir(&state.settings().work_dir, &path).await,
        },
        Command::Cat(path) => {
            if let Some(denied) = check_exec_allowed(state, chat_id) {
                denied
            } else if path.trim().is_empty() {
                "Usage: `/cat <path>`\nExample: `/cat Cargo.toml`".to_string()
            } else {
                exec::read_file(&state.settings().work_dir, &path).await
            }
        }
    };

    reply(state, chat_id, &text).await
}

/// Answer an ordinary message according to the bot mode.
pub async fn handle_text(state: &BotState, msg: &InboundMessage) -> Result<()> {
    match state.text_handler() {
        TextHandler::Echo => {
            debug!(chat_id = msg.chat_id, "Echoing message");
            state
                .channel()
                .send_text(msg.chat_id, &msg.text, TextFormat::Plain)
                .await?;
        }
        TextHandler::Assistant(router) => {
            let outbound = router.handle(msg).await?;
            debug!(
                chat_id = msg.chat_id,
                mode = %outbound.mode,
                format = ?outbound.format,
                "Reply delivered"
            );
        }
        TextHandler::Bridge(queue) => {
            let path = queue.enqueue_inbound(msg)?;
            queue.set_recipient(msg.chat_id)?;
            info!(chat_id = msg.chat_id, path = %path.display(), "Message queued for bridge");
            state
                .channel()
                .send_text(msg.chat_id, QUEUED_REPLY, TextFormat::Plain)
                .await?;
        }
    }
    Ok(())
}

/// Acknowledgement sent in bridge mode.
pub const QUEUED_REPLY: &str = "📨 Queued. The reply will arrive here.";

/// Reply sent when a chat may not use /run, /ls or /cat.
pub const EXEC_DENIED_REPLY: &str = "🚫 Local commands are disabled for this chat.";

fn check_exec_allowed(state: &BotState, chat_id: i64) -> Option<String> {
    if state.settings().is_exec_allowed(chat_id) {
        None
    } else {
        warn!(chat_id, "Local command refused by allow-list");
        Some(EXEC_DENIED_REPLY.to_string())
    }
}

async fn reply(state: &BotState, chat_id: i64, text: &str) -> Result<()> {
    deliver_chunked(state.channel().as_ref(), chat_id, text).await?;
    Ok(())
}

/// Welcome text for /start.
pub fn start_text(handler: &TextHandler) -> String {
    let body = match handler {
        TextHandler::Assistant(_) => {
            "I'm your mobile work brain.\n\
             Send me a message and I'll auto-detect your work mode:\n\
             💡 Brainstorm · 📋 Plan · ✍️ Draft · 🔍 Review · ⚖️ Decide"
        }
        TextHandler::Echo => "Echo mode: I'll send back whatever you write.",
        TextHandler::Bridge(_) => {
            "Bridge mode: your messages are queued for your workstation \
             and its replies are relayed back here."
        }
    };
    format!("🚀 *Antigravity Bot is online.*\n\n{body}")
}

/// Command listing plus the work-mode keywords.
pub fn help_text() -> String {
    let modes: Vec<String> = MODE_RULES
        .iter()
        .map(|rule| {
            format!(
                "{} {}: {}",
                rule.mode.emoji(),
                rule.mode.label(),
                rule.keywords.join(", ")
            )
        })
        .collect();

    format!(
        "{}\n\n*Work modes* (auto-detected):\n{}",
        Command::descriptions(),
        modes.join("\n")
    )
}

/// Diagnostic text for /mode.
pub fn mode_text(state: &BotState) -> String {
    let handler = state.text_handler();
    let detail = match handler {
        TextHandler::Assistant(router) => format!("🔗 *LLM:* `{}`", router.adapter().describe()),
        TextHandler::Echo => "No LLM backend in use.".to_string(),
        TextHandler::Bridge(queue) => {
            format!("📂 *Queue:* `{}`", queue.config().root().display())
        }
    };
    format!("🤖 *Bot mode:* {}\n{detail}", handler.bot_mode())
}
