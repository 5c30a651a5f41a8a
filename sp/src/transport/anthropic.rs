//! Anthropic Claude API transport
//!
//! Adapts the Messages API envelope to the plain-text [`ModelTransport`] contract.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, send};
use super::{ModelTransport, TransportError};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API transport
pub struct AnthropicTransport {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl AnthropicTransport {
    /// Create a new transport from configuration
    ///
    /// Reads the API key from the environment variable named in config.
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

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        debug!(%self.model, %self.max_tokens, "build_request_body: called");
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": prompt },
            ],
        })
    }
}

#[async_trait]
impl ModelTransport for AnthropicTransport {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        debug!(%self.model, prompt_len = prompt.len(), "generate: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(prompt);

        let response = send(
            self.http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body),
            self.timeout,
        )
        .await?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        api_response.into_text()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicResponse {
    /// Concatenate the text blocks of the response
    fn into_text(self) -> Result<String, TransportError> {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            debug!("into_text: no text blocks");
            return Err(TransportError::InvalidResponse(
                "Anthropic response contained no text".to_string(),
            ));
        }
        Ok(text)
    }
}
