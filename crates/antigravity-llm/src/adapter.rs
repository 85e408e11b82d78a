//! Mode-aware completion with bounded retry on rate limits.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use antigravity_core::{system_prompt_for, Settings, WorkMode};

use crate::backend::{backend_from_settings, LlmBackend};
use crate::config::{ModelConfig, RetryPolicy};
use crate::error::{BackendError, Result};
use crate::types::{LlmOutcome, LlmRequest};

/// Turns a user message plus a work mode into a reply from the backend.
#[derive(Clone)]
pub struct LlmAdapter {
    backend: Arc<dyn LlmBackend>,
    config: ModelConfig,
    retry: RetryPolicy,
}

impl LlmAdapter {
    /// Create an adapter over a backend.
    pub fn new(backend: Arc<dyn LlmBackend>, config: ModelConfig) -> Self {
        Self {
            backend,
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the adapter for the configured backend.
    ///
    /// Fails when no backend is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let backend = settings.backend.as_ref().ok_or_else(|| {
            BackendError::Configuration("no LLM backend configured".to_string())
        })?;
        let client = backend_from_settings(backend, settings.llm_timeout)?;
        Ok(Self::new(client, ModelConfig::new(backend.model())))
    }

    /// The request sent for `message` in `mode`.
    pub fn request_for(&self, message: &str, mode: WorkMode) -> LlmRequest {
        LlmRequest {
            mode,
            system: system_prompt_for(mode).to_string(),
            user: message.to_string(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Ask the backend, retrying rate-limited attempts with linear backoff.
    ///
    /// Waits `n × step` after the n-th rate-limited attempt, except after the
    /// last one. Timeouts and other failures are not retried.
    pub async fn complete(&self, message: &str, mode: WorkMode) -> LlmOutcome {
        let request = self.request_for(message, mode);
        let mut retry_after: Option<Duration> = None;

        for attempt in 1..=self.retry.max_attempts {
            match self.backend.generate(&request).await {
                Ok(Some(text)) => return LlmOutcome::Success(text),
                Ok(None) => return LlmOutcome::Empty,
                Err(BackendError::RateLimited {
                    retry_after: hint,
                    detail,
                }) => {
                    retry_after = hint.or(retry_after);
                    if attempt == self.retry.max_attempts {
                        warn!(
                            backend = self.backend.name(),
                            attempts = attempt,
                            detail = %detail,
                            "Rate limited, giving up"
                        );
                        break;
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        backend = self.backend.name(),
                        attempt,
                        delay_secs = delay.as_secs(),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(BackendError::Timeout) => {
                    warn!(backend = self.backend.name(), "LLM request timed out");
                    return LlmOutcome::Timeout;
                }
                Err(e) => {
                    error!(backend = self.backend.name(), error = %e, "LLM request failed");
                    return LlmOutcome::Failed(e.to_string());
                }
            }
        }

        LlmOutcome::RateLimited {
            attempts: self.retry.max_attempts,
            retry_after,
        }
    }

    /// Like [`complete`](Self::complete) but returns the chat-ready text.
    pub async fn ask(&self, message: &str, mode: WorkMode) -> String {
        self.complete(message, mode).await.into_reply()
    }

    /// One-line summary for startup logs and `/mode`.
    pub fn describe(&self) -> String {
        format!(
            "{} ({}) at {}",
            self.backend.name(),
            self.config.model,
            self.backend.endpoint()
        )
    }

    /// Log which backend is in use.
    pub fn log_startup(&self) {
        info!(backend = %self.describe(), "LLM backend ready");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::types::{EMPTY_REPLY, RATE_LIMITED_REPLY, TIMEOUT_REPLY};
    use tokio::time::Instant;

    fn adapter(backend: Arc<ScriptedBackend>) -> LlmAdapter {
        LlmAdapter::new(backend, ModelConfig::new("test-model"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_rate_limits() {
        let backend = Arc::new(ScriptedBackend::new([
            ScriptedBackend::rate_limited(),
            ScriptedBackend::rate_limited(),
            Ok(Some("here is the plan".to_string())),
        ]));
        let adapter = adapter(backend.clone());

        let start = Instant::now();
        let outcome = adapter.complete("plan it", WorkMode::Plan).await;

        assert_eq!(outcome, LlmOutcome::Success("here is the plan".into()));
        assert_eq!(backend.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let backend = Arc::new(ScriptedBackend::new(
            std::iter::repeat_with(ScriptedBackend::rate_limited).take(10),
        ));
        let adapter = adapter(backend.clone());

        let start = Instant::now();
        let outcome = adapter.complete("hello", WorkMode::General).await;

        assert_eq!(backend.calls(), 3);
        assert!(matches!(
            outcome,
            LlmOutcome::RateLimited { attempts: 3, .. }
        ));
        assert_eq!(outcome.into_reply(), RATE_LIMITED_REPLY);
        // 15s + 30s, no sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_policy() {
        let backend = Arc::new(ScriptedBackend::new([
            ScriptedBackend::rate_limited(),
            Ok(Some("ok".to_string())),
        ]));
        let adapter = adapter(backend.clone()).with_retry(
            RetryPolicy::new()
                .with_max_attempts(2)
                .with_backoff_step(Duration::from_secs(1)),
        );

        let start = Instant::now();
        assert_eq!(adapter.ask("x", WorkMode::General).await, "ok");
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new([Err(BackendError::Timeout)]));
        let adapter = adapter(backend.clone());

        assert_eq!(adapter.ask("hi", WorkMode::General).await, TIMEOUT_REPLY);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let backend = Arc::new(ScriptedBackend::new([Err(BackendError::Http {
            status: 500,
            body: "internal".into(),
        })]));
        let adapter = adapter(backend.clone());

        let outcome = adapter.complete("hi", WorkMode::General).await;
        assert!(matches!(outcome, LlmOutcome::Failed(_)));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_response() {
        let backend = Arc::new(ScriptedBackend::new([Ok(None)]));
        let adapter = adapter(backend);

        assert_eq!(adapter.ask("hi", WorkMode::General).await, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_request_carries_mode_prompt() {
        let backend = Arc::new(ScriptedBackend::replying("done"));
        let adapter = adapter(backend.clone());

        adapter
            .complete("can you help me plan the launch", WorkMode::Plan)
            .await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mode, WorkMode::Plan);
        assert_eq!(requests[0].system, system_prompt_for(WorkMode::Plan));
        assert_eq!(requests[0].user, "can you help me plan the launch");
        assert_eq!(requests[0].model, "test-model");
    }

    #[test]
    fn test_describe() {
        let adapter = adapter(Arc::new(ScriptedBackend::default()));
        assert_eq!(adapter.describe(), "scripted (test-model) at memory://scripted");
    }

    #[test]
    fn test_from_settings_requires_backend() {
        let settings = Settings::from_lookup(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            "BOT_MODE" => Some("echo".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(LlmAdapter::from_settings(&settings).is_err());
    }
}
