//! Local Ollama `/api/chat` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backend::{http_client, read_body, LlmBackend};
use crate::error::Result;
use crate::types::LlmRequest;

/// Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the Ollama server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    async fn generate(&self, request: &LlmRequest) -> Result<Option<String>> {
        let body = ChatRequest::from_request(request);
        trace!("Sending Ollama request: {:?}", body);

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let response: ChatResponse = serde_json::from_str(&text)?;

        debug!(
            model = %request.model,
            eval_count = response.eval_count.unwrap_or(0),
            "Ollama response received"
        );

        Ok(response
            .message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty()))
    }
}

/// `/api/chat` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Always false; the bot needs the whole reply at once.
    pub stream: bool,
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Build the wire body for a request.
    pub fn from_request(request: &LlmRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: request.user.clone(),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Sampling options.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// `/api/chat` response body (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    pub eval_count: Option<u32>,
}
