//! OpenAI API transport
//!
//! Adapts the Chat Completions envelope to the plain-text [`ModelTransport`] contract.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, send};
use super::{ModelTransport, TransportError};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API transport
pub struct OpenAITransport {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAITransport {
    /// Create a new transport from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, TransportError> {
        debug!(provider = %config.provider, model = %config.model, "from_config: called");
        let api_key = config.get_api_key()?;
        let timeout = config.timeout();

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url_or(DEFAULT_BASE_URL),
            http: build_client(timeout)?,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        debug!(%self.model, %self.max_tokens, "build_request_body: called");

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt },
            ],
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(self.max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(self.max_tokens);
        }

        body
    }
}

#[async_trait]
impl ModelTransport for OpenAITransport {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        debug!(%self.model, prompt_len = prompt.len(), "generate: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(prompt);

        let response = send(
            self.http
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(&body),
            self.timeout,
        )
        .await?;

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        api_response.into_text()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIResponse {
    /// Take the content of the first choice
    fn into_text(self) -> Result<String, TransportError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("OpenAI response contained no text".to_string()))
    }
}
