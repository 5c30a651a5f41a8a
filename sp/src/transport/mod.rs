//! Model transports
//!
//! The pipeline only sees [`ModelTransport`]; vendor envelopes and API keys
//! stay in here.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod http;
mod openai;

pub use anthropic::AnthropicTransport;
pub use client::ModelTransport;
pub use error::TransportError;
pub use gemini::GeminiTransport;
pub use openai::OpenAITransport;

use crate::config::LlmConfig;

/// Create a transport for the provider named in config
///
/// Supports "anthropic", "openai" and "gemini".
pub fn create_transport(config: &LlmConfig) -> Result<Arc<dyn ModelTransport>, TransportError> {
    debug!(provider = %config.provider, model = %config.model, "create_transport: called");
    match config.provider.as_str() {
        "anthropic" => {
            debug!("create_transport: creating Anthropic transport");
            Ok(Arc::new(AnthropicTransport::from_config(config)?))
        }
        "openai" => {
            debug!("create_transport: creating OpenAI transport");
            Ok(Arc::new(OpenAITransport::from_config(config)?))
        }
        "gemini" => {
            debug!("create_transport: creating Gemini transport");
            Ok(Arc::new(GeminiTransport::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_transport: unknown provider");
            Err(TransportError::UnknownProvider(other.to_string()))
        }
    }
}
