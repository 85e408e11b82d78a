//! Model and retry configuration for the LLM adapter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "gemini-2.0-flash", "llama3.2").
    pub model: String,

    /// Maximum tokens to generate in responses.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration with the given model ID.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Bounded retry with linearly growing backoff for rate-limited calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `n × backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Creates the default policy (3 attempts, 15s step).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of attempts. At least one attempt is always made.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the backoff step.
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Wait before retrying after the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}
