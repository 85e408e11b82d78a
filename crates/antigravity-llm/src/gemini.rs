//! Google Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backend::{http_client, read_body, LlmBackend};
use crate::error::Result;
use crate::types::LlmRequest;

/// Gemini API host.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the client at another host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url_for(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LlmBackend for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models", self.base_url)
    }

    async fn generate(&self, request: &LlmRequest) -> Result<Option<String>> {
        let body = GenerateRequest::from_request(request);
        trace!("Sending Gemini request: {:?}", body);

        let response = self
            .client
            .post(self.url_for(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let response: GenerateResponse = serde_json::from_str(&text)?;

        debug!(
            model = %request.model,
            tokens = response.usage_metadata.as_ref().map_or(0, |u| u.total_token_count),
            "Gemini response received"
        );

        Ok(response.text())
    }
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Persona and task framing.
    pub system_instruction: Content,
    /// Conversation turns; always a single user turn here.
    pub contents: Vec<Content>,
    /// Sampling parameters.
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// Build the wire body for a request.
    pub fn from_request(request: &LlmRequest) -> Self {
        Self {
            system_instruction: Content::text(None, &request.system),
            contents: vec![Content::text(Some("user"), &request.user)],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// A content block made of text parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Author role, omitted for the system instruction.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,

    /// Text parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

/// One part of a content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Text of the part; non-text parts have none.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

/// Sampling parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Generated candidates; may be absent when output was blocked.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Token usage information.
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// A generated candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use antigravity_core::{system_prompt_for, WorkMode};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> LlmRequest {
        LlmRequest {
            mode: WorkMode::Plan,
            system: system_prompt_for(WorkMode::Plan).to_string(),
            user: "plan the launch".into(),
            model: "gemini-2.0-flash".into(),
            max_tokens: 2048,
            temperature: 0.7,
        }
    }

    fn client(server: &MockServer, timeout: Duration) -> GeminiClient {
        GeminiClient::new("test-key", timeout)
            .unwrap()
            .with_base_url(server.uri())
    }

    #[test]
    fn test_request_serialization() {
        let body = serde_json::to_value(GenerateRequest::from_request(&request())).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "plan the launch");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("MODE: Planning"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "1. "}, {"text": "Ship"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 12}
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("1. Ship"));
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(response.text(), None);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "plan the launch"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Step 1"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, Duration::from_secs(5))
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("Step 1"));
    }

    #[tokio::test]
    async fn test_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .generate(&request())
            .await
            .unwrap_err();
        match err {
            BackendError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resource_exhausted_body_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string(
                r#"{"error": {"code": 503, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_millis(100))
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout));
    }
}
