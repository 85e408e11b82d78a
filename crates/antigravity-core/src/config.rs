//! Filesystem locations used by the bot.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.antigravity/
//! ├── config/       # .env.local with secrets
//! └── bridge/       # file-relay queue (bridge mode)
//!     ├── inbox/
//!     ├── outbox/
//!     └── chat_id
//! ```
//!
//! # Environment Variables
//!
//! - `ANTIGRAVITY_STATE_DIR`: Override the base state directory

use std::path::PathBuf;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "ANTIGRAVITY_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".antigravity";

const CONFIG_SUBDIR: &str = "config";
const BRIDGE_SUBDIR: &str = "bridge";

/// Resolve the state directory from an optional override.
///
/// Falls back to `~/.antigravity`, then `.antigravity` in the current
/// directory when no home directory is known.
pub fn resolve_state_dir(override_dir: Option<String>) -> PathBuf {
    override_dir
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Get the state directory, honouring `ANTIGRAVITY_STATE_DIR`.
pub fn state_dir() -> PathBuf {
    resolve_state_dir(std::env::var(STATE_DIR_ENV).ok())
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the .env.local file path.
///
/// Environment file for secrets (API keys, tokens).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Default bridge root below a state directory.
pub fn default_bridge_dir(state_dir: &std::path::Path) -> PathBuf {
    state_dir.join(BRIDGE_SUBDIR)
}
