//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a model service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Unknown model provider: '{0}'. Supported: anthropic, openai, gemini")]
    UnknownProvider(String),
}

impl TransportError {
    /// Map a reqwest failure, folding client-side timeouts into [`TransportError::Timeout`]
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::Network(err)
        }
    }

    /// Check if a user-initiated retry has a chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::RateLimited { .. } => true,
            TransportError::Api { status, .. } => *status == 408 || *status >= 500,
            TransportError::Network(_) => true,
            TransportError::Timeout(_) => true,
            TransportError::InvalidResponse(_) => false,
            TransportError::MissingApiKey(_) => false,
            TransportError::UnknownProvider(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TransportError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            TransportError::Api {
                status: 503,
                message: "Unavailable".to_string()
            }
            .is_retryable()
        );

        // 4xx errors should not be retryable
        assert!(
            !TransportError::Api {
                status: 401,
                message: "Unauthorized".to_string()
            }
            .is_retryable()
        );

        assert!(
            TransportError::Api {
                status: 408,
                message: "Request Timeout".to_string()
            }
            .is_retryable()
        );
        assert!(TransportError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!TransportError::InvalidResponse("no text".to_string()).is_retryable());
        assert!(!TransportError::MissingApiKey("KEY".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = TransportError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(TransportError::Timeout(Duration::from_secs(1)).retry_after(), None);
    }

    #[test]
    fn test_messages_name_the_cause() {
        let err = TransportError::MissingApiKey("GOOGLE_API_KEY".to_string());
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let err = TransportError::UnknownProvider("acme".to_string());
        assert!(err.to_string().contains("acme"));
    }
}
