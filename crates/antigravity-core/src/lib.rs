//! Antigravity Core - shared logic for the Antigravity bot.
//!
//! - **mode**: keyword-based work mode classification
//! - **prompts**: per-mode system instructions
//! - **message**: inbound chat messages
//! - **channel**: outbound channel trait with Markdown/plain fallback
//! - **chunk**: splitting text to the Telegram message limit
//! - **config**: state directory locations
//! - **settings**: process settings loaded from the environment

pub mod channel;
pub mod chunk;
pub mod config;
pub mod error;
pub mod message;
pub mod mode;
pub mod prompts;
pub mod settings;

pub use channel::{deliver_chunked, deliver_with_fallback, Channel, ChannelError, TextFormat};
pub use chunk::{split_chunks, TELEGRAM_MAX_MESSAGE_LEN};
pub use config::{env_file, state_dir};
pub use error::ConfigError;
pub use message::InboundMessage;
pub use mode::{detect_mode, ModeRule, WorkMode, MODE_RULES};
pub use prompts::{system_prompt_for, system_prompt_for_name};
pub use settings::{BackendSettings, BotMode, Settings};
