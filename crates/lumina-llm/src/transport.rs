//! Chat-completion transport: the wire seam under the gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    /// A user-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

/// Request body for a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    /// Text of the first choice.
    pub content: String,
    /// Total tokens billed for the call, 0 when the upstream omits usage.
    pub total_tokens: u64,
}

/// Sends one chat-completion request. Implementations do not retry.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Performs a single completion call.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError>;
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer key. Requests are still sent without one and fail upstream.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// `reqwest`-backed transport for OpenAI-compatible chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl OpenAiTransport {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the key is not a valid header
    /// value or the client cannot be constructed.
    pub fn new(config: &OpenAiConfig) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| LlmError::Configuration(format!("invalid api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            headers,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    total_tokens: u64,
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|e| LlmError::Response(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Response("missing choices".to_owned()))?;
        let total_tokens = body.usage.map_or(0, |u| u.total_tokens);

        debug!(total_tokens, content_len = content.len(), "chat completion received");
        Ok(ChatCompletion {
            content,
            total_tokens,
        })
    }
}

/// Masks a secret for logging, keeping the first and last four characters.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_owned();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_hides_middle() {
        assert_eq!(mask_key("sk-1234567890abcd"), "sk-1****abcd");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_endpoint_joins_base_url_without_double_slash() {
        let transport = OpenAiTransport::new(&OpenAiConfig {
            base_url: "https://llm.example.com/v1/".to_owned(),
            api_key: Some("key".to_owned()),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        assert_eq!(transport.endpoint, "https://llm.example.com/v1/chat/completions");
        assert!(transport.headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn test_completion_body_tolerates_missing_usage() {
        let body: CompletionBody =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap();

        assert!(body.usage.is_none());
        assert_eq!(body.choices[0].message.content.as_deref(), Some("hi"));
    }
}
