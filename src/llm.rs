//! HTTP client for the LLM collaborator (OpenAI-compatible chat completions).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::KudosError;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

const SERVICE: &str = "llm";

/// One turn of a chat-completions conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single completion request.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub temperature: f64,
    pub max_tokens: u64,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    /// Kept as a raw value: with `response_format: json_object` some
    /// providers return the object inline, others as a JSON-encoded string.
    content: Option<serde_json::Value>,
}

pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    /// Send one chat-completions request and return the first choice's content.
    ///
    /// `json_object` asks the provider for a structured JSON reply (used by
    /// the strength analyzer); plain chat leaves it off.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: Sampling,
        json_object: bool,
    ) -> Result<serde_json::Value, KudosError> {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
        });
        if json_object {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(KudosError::RateLimited {
                service: SERVICE.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(KudosError::AuthFailed {
                service: SERVICE.to_string(),
                message: format!("{status}"),
            });
        }

        // Catch-all for any non-success status. Cap error body reads to
        // MAX_RESPONSE_BYTES to prevent memory exhaustion.
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(KudosError::Upstream {
                service: SERVICE.to_string(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        // Enforce response size limit before parsing
        let bytes = response.bytes().await.map_err(|e| KudosError::Upstream {
            service: SERVICE.to_string(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(KudosError::Upstream {
                service: SERVICE.to_string(),
                message: format!(
                    "response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_RESPONSE_BYTES
                ),
                status: None,
            });
        }

        let completion: ChatCompletion = serde_json::from_slice(&bytes)
            .map_err(|e| KudosError::SchemaParse(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| KudosError::Upstream {
                service: SERVICE.to_string(),
                message: "empty choices or null content".to_string(),
                status: None,
            })
    }
}

/// Flatten a completion content value into plain text.
pub fn content_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
