//! Process settings, read once at startup and passed down explicitly.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::config::{default_bridge_dir, resolve_state_dir, STATE_DIR_ENV};
use crate::error::{ConfigError, Result};

/// Placeholder shipped in `.env.example` for the bot token.
pub const TOKEN_PLACEHOLDER: &str = "your-telegram-bot-token-here";

/// Placeholder shipped in `.env.example` for the Gemini key.
pub const GEMINI_KEY_PLACEHOLDER: &str = "your-gemini-api-key-here";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Default backend request timeout in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// What the bot does with ordinary (non-command) text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotMode {
    /// Echo the text back unchanged.
    Echo,
    /// Classify and answer through the LLM.
    #[default]
    Assistant,
    /// Queue the text for an external process via the file bridge.
    Bridge,
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::Assistant => write!(f, "assistant"),
            Self::Bridge => write!(f, "bridge"),
        }
    }
}

impl FromStr for BotMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "assistant" | "llm" => Ok(Self::Assistant),
            "bridge" => Ok(Self::Bridge),
            _ => Err("expected echo, assistant or bridge".into()),
        }
    }
}

/// The single LLM backend active for this deployment.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendSettings {
    /// Google Gemini cloud API.
    Gemini { api_key: String, model: String },
    /// Local Ollama server.
    Ollama { base_url: String, model: String },
}

impl BackendSettings {
    /// Short backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::Ollama { .. } => "ollama",
        }
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini { model, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
            Self::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

/// Immutable application settings.
#[derive(Clone)]
pub struct Settings {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Handling of ordinary messages.
    pub bot_mode: BotMode,
    /// LLM backend; always present in assistant mode.
    pub backend: Option<BackendSettings>,
    /// Timeout for a single backend request.
    pub llm_timeout: Duration,
    /// Root of the file bridge queue.
    pub bridge_dir: PathBuf,
    /// Root for /run, /ls and /cat.
    pub work_dir: PathBuf,
    /// Chats allowed to use local capabilities. `None` allows everyone.
    pub allowed_chats: Option<HashSet<i64>>,
    /// Base log level.
    pub log_level: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("telegram_token", &"<redacted>")
            .field("bot_mode", &self.bot_mode)
            .field("backend", &self.backend)
            .field("llm_timeout", &self.llm_timeout)
            .field("bridge_dir", &self.bridge_dir)
            .field("work_dir", &self.work_dir)
            .field("allowed_chats", &self.allowed_chats)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_token = get("TELEGRAM_BOT_TOKEN")
            .filter(|t| t != TOKEN_PLACEHOLDER)
            .ok_or(ConfigError::MissingToken)?;

        let bot_mode = match get("BOT_MODE") {
            Some(raw) => raw.parse::<BotMode>().map_err(|reason| ConfigError::InvalidValue {
                var: "BOT_MODE",
                value: raw,
                reason,
            })?,
            None => BotMode::default(),
        };

        let backend = match Self::backend_from(&get) {
            Ok(backend) => Some(backend),
            Err(e) if bot_mode == BotMode::Assistant => return Err(e),
            Err(e) => {
                debug!(error = %e, mode = %bot_mode, "No LLM backend configured");
                None
            }
        };

        let llm_timeout = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "LLM_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".into(),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        };

        let state_dir = resolve_state_dir(get(STATE_DIR_ENV));
        let bridge_dir = get("BRIDGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_bridge_dir(&state_dir));
        let work_dir = get("WORK_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let allowed_chats = match get("TELEGRAM_ALLOWED_CHATS") {
            Some(raw) => Some(parse_chat_list(&raw)?),
            None => None,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => parse_log_level(&raw)?,
            None => "info".to_string(),
        };

        Ok(Self {
            telegram_token,
            bot_mode,
            backend,
            llm_timeout,
            bridge_dir,
            work_dir,
            allowed_chats,
            log_level,
        })
    }

    fn backend_from<G>(get: &G) -> Result<BackendSettings>
    where
        G: Fn(&str) -> Option<String>,
    {
        let name = get("LLM_BACKEND").unwrap_or_else(|| "gemini".to_string());
        match name.to_lowercase().as_str() {
            "gemini" => {
                let api_key = get("GEMINI_API_KEY")
                    .filter(|k| k != GEMINI_KEY_PLACEHOLDER)
                    .ok_or(ConfigError::MissingCredential {
                        var: "GEMINI_API_KEY",
                    })?;
                Ok(BackendSettings::Gemini {
                    api_key,
                    model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                })
            }
            "ollama" => Ok(BackendSettings::Ollama {
                base_url: get("OLLAMA_URL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.into())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            }),
            _ => Err(ConfigError::InvalidValue {
                var: "LLM_BACKEND",
                value: name,
                reason: "expected gemini or ollama".into(),
            }),
        }
    }

    /// Whether a chat may use /run, /ls and /cat.
    pub fn is_exec_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats
            .as_ref()
            .map_or(true, |chats| chats.contains(&chat_id))
    }
}

/// Normalize a level name to one `tracing` accepts. Python-style names
/// (`WARNING`, `CRITICAL`) are mapped to their nearest equivalent.
fn parse_log_level(raw: &str) -> Result<String> {
    let level = match raw.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => {
            return Err(ConfigError::InvalidValue {
                var: "LOG_LEVEL",
                value: raw.to_string(),
                reason: "expected trace, debug, info, warn or error".into(),
            })
        }
    };
    Ok(level.to_string())
}

fn parse_chat_list(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
                var: "TELEGRAM_ALLOWED_CHATS",
                value: s.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
