//! LLM adapter for the Antigravity bot.
//!
//! Wraps a text-generation backend (Google Gemini or a local Ollama server)
//! behind [`LlmBackend`] and adds what the bot needs on top: the system
//! prompt for the detected [`WorkMode`](antigravity_core::WorkMode), bounded
//! retry with linear backoff on rate limits, and fixed user-facing replies
//! for every failure.
//!
//! # Example
//!
//! ```ignore
//! use antigravity_core::{detect_mode, Settings};
//! use antigravity_llm::LlmAdapter;
//!
//! let settings = Settings::from_env()?;
//! let adapter = LlmAdapter::from_settings(&settings)?;
//! let text = "can you help me plan the launch";
//! let reply = adapter.ask(text, detect_mode(text)).await;
//! ```

pub mod adapter;
pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
pub mod ollama;
pub mod types;

pub use adapter::LlmAdapter;
pub use backend::{backend_from_settings, LlmBackend};
pub use config::{ModelConfig, RetryPolicy};
pub use error::{BackendError, Result};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use types::{
    LlmOutcome, LlmRequest, EMPTY_REPLY, FAILURE_REPLY, RATE_LIMITED_REPLY, TIMEOUT_REPLY,
};

#[cfg(any(test, feature = "test-util"))]
pub use backend::scripted::ScriptedBackend;
