//! Google Gemini API transport
//!
//! Adapts the generateContent envelope to the plain-text [`ModelTransport`] contract.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, send};
use super::{ModelTransport, TransportError};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Sampling temperature sent with every request
const TEMPERATURE: f64 = 0.7;

/// Google Gemini API transport
pub struct GeminiTransport {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl GeminiTransport {
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

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        debug!(%self.model, %self.max_tokens, "build_request_body: called");
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] },
            ],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": self.max_tokens,
            },
        })
    }
}

#[async_trait]
impl ModelTransport for GeminiTransport {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        debug!(%self.model, prompt_len = prompt.len(), "generate: called");
        let url = self.endpoint();
        let body = self.build_request_body(prompt);

        // Key goes in a header so it never shows up in logged URLs
        let response = send(
            self.http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&body),
            self.timeout,
        )
        .await?;

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        api_response.into_text()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Take the text of the first part of the first candidate
    fn into_text(self) -> Result<String, TransportError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("Gemini response contained no text".to_string()))
    }
}
