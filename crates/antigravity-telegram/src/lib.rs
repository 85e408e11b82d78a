//! Telegram front end for the Antigravity bot.
//!
//! Answers chat messages in one of three modes chosen at startup:
//!
//! - **assistant**: classify the message into a work mode, ask the LLM with
//!   that mode's instruction and reply under a mode header
//! - **echo**: send the text back unchanged
//! - **bridge**: queue the message on disk for another process and relay
//!   that process's replies from the outbox
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `GEMINI_API_KEY`: when `LLM_BACKEND=gemini` in assistant mode
//!
//! Optional:
//! - `BOT_MODE`: `assistant` (default), `echo` or `bridge`
//! - `LLM_BACKEND`: `gemini` (default) or `ollama`
//! - `GEMINI_MODEL`, `OLLAMA_URL`, `OLLAMA_MODEL`, `LLM_TIMEOUT_SECS`
//! - `BRIDGE_DIR`, `WORK_DIR`, `TELEGRAM_ALLOWED_CHATS`, `LOG_LEVEL`
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Commands and work-mode keywords
//! - `/mode` - Show the bot mode and LLM backend
//! - `/run <cmd>` - Run a shell command in the work directory
//! - `/ls [path]` - List files
//! - `/cat <path>` - Show a file

pub mod bot;
pub mod channel;
pub mod error;
pub mod exec;
pub mod handlers;
pub mod router;
pub mod state;

pub use bot::AntigravityBot;
pub use channel::TelegramChannel;
pub use error::{BotError, Result};
pub use handlers::Command;
pub use router::{format_reply, MessageRouter, OutboundReply};
pub use state::{BotState, TextHandler};
