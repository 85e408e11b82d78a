//! Request and outcome types shared by all backends.

use std::fmt;
use std::time::Duration;

use antigravity_core::WorkMode;

/// Reply shown when the backend returned no text.
pub const EMPTY_REPLY: &str = "⚠️ Empty response.";

/// Reply shown once rate-limit retries are exhausted.
pub const RATE_LIMITED_REPLY: &str = "⏳ Rate limited. Wait about a minute and try again.";

/// Reply shown when the backend did not answer in time.
pub const TIMEOUT_REPLY: &str = "⌛ The AI backend timed out. Try again.";

/// Reply shown for any other backend failure.
pub const FAILURE_REPLY: &str = "⚠️ Something went wrong with the AI. Try again.";

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// Mode the instruction was chosen for.
    pub mode: WorkMode,
    /// System instruction.
    pub system: String,
    /// The user's text, unchanged.
    pub user: String,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// What came of asking the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutcome {
    /// Generated text.
    Success(String),
    /// The backend answered without any text.
    Empty,
    /// Every attempt was rate limited.
    RateLimited {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last wait hint from the backend.
        retry_after: Option<Duration>,
    },
    /// The backend did not answer in time.
    Timeout,
    /// Any other failure, with its reason for the logs.
    Failed(String),
}

impl LlmOutcome {
    /// Text to show in the chat.
    pub fn into_reply(self) -> String {
        match self {
            Self::Success(text) => text,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for LlmOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(text) => f.write_str(text),
            Self::Empty => f.write_str(EMPTY_REPLY),
            Self::RateLimited { .. } => f.write_str(RATE_LIMITED_REPLY),
            Self::Timeout => f.write_str(TIMEOUT_REPLY),
            Self::Failed(_) => f.write_str(FAILURE_REPLY),
        }
    }
}
