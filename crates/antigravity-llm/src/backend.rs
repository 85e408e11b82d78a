//! The backend seam: one trait, one implementation per provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use antigravity_core::BackendSettings;

use crate::error::{BackendError, Result};
use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;
use crate::types::LlmRequest;

/// Marker Google APIs put in quota errors.
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// A text-generation backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short name ("gemini", "ollama").
    fn name(&self) -> &'static str;

    /// Where requests go, for diagnostics. Never contains credentials.
    fn endpoint(&self) -> String;

    /// Generate a reply. `Ok(None)` means the backend answered without text.
    async fn generate(&self, request: &LlmRequest) -> Result<Option<String>>;
}

/// Build the configured backend.
pub fn backend_from_settings(
    settings: &BackendSettings,
    timeout: Duration,
) -> Result<Arc<dyn LlmBackend>> {
    Ok(match settings {
        BackendSettings::Gemini { api_key, .. } => Arc::new(GeminiClient::new(api_key, timeout)?),
        BackendSettings::Ollama { base_url, .. } => {
            Arc::new(OllamaClient::new(base_url, timeout)?)
        }
    })
}

/// Build an HTTP client with a whole-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Read the body, turning rate limits and non-success statuses into errors.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS
        || (!status.is_success() && body.contains(RESOURCE_EXHAUSTED))
    {
        return Err(BackendError::RateLimited {
            retry_after,
            detail: truncate(&body, 300),
        });
    }

    if !status.is_success() {
        return Err(BackendError::Http {
            status: status.as_u16(),
            body: truncate(&body, 500),
        });
    }

    Ok(body)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

/// Backend driven by a fixed script of responses.
#[cfg(any(test, feature = "test-util"))]
pub mod scripted {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued results in order and records every request.
    #[derive(Debug, Default)]
    pub struct ScriptedBackend {
        script: Mutex<VecDeque<Result<Option<String>>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(script: impl IntoIterator<Item = Result<Option<String>>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Backend that always answers with `text`.
        pub fn replying(text: &str) -> Self {
            Self::new(std::iter::repeat_with(|| Ok(Some(text.to_string()))).take(64))
        }

        /// A rate-limit error as the backends produce it.
        pub fn rate_limited() -> Result<Option<String>> {
            Err(BackendError::RateLimited {
                retry_after: None,
                detail: "429 Too Many Requests".into(),
            })
        }

        /// Requests received so far.
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Number of calls received so far.
        pub fn calls(&self) -> usize {
            self.requests().len()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn endpoint(&self) -> String {
            "memory://scripted".into()
        }

        async fn generate(&self, request: &LlmRequest) -> Result<Option<String>> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.script
                .lock()
                .ok()
                .and_then(|mut s| s.pop_front())
                .unwrap_or_else(|| Err(BackendError::Request("script exhausted".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("20"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(20)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééé", 2), "éé...");
    }

    #[test]
    fn test_backend_from_settings() {
        let gemini = backend_from_settings(
            &BackendSettings::Gemini {
                api_key: "secret".into(),
                model: "gemini-2.0-flash".into(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(gemini.name(), "gemini");
        assert!(!gemini.endpoint().contains("secret"));

        let ollama = backend_from_settings(
            &BackendSettings::Ollama {
                base_url: "http://localhost:11434".into(),
                model: "llama3.2".into(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(ollama.name(), "ollama");
        assert_eq!(ollama.endpoint(), "http://localhost:11434/api/chat");
    }
}
