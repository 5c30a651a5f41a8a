//! ModelTransport trait definition

use async_trait::async_trait;

use super::TransportError;

/// Text-in, text-out access to a generative model
///
/// Implementations adapt a vendor envelope into this two-outcome contract:
/// the response text on success, a [`TransportError`] otherwise. Nothing
/// downstream of this trait knows which vendor answered.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Send one instruction and wait for the full response text
    async fn generate(&self, prompt: &str) -> Result<String, TransportError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::debug;

    /// Scripted transport for unit tests
    ///
    /// Replays queued outcomes in order, optionally after a delay.
    pub struct MockTransport {
        outcomes: Mutex<VecDeque<(Duration, Result<String, TransportError>)>>,
        prompts: Mutex<Vec<String>>,
        call_count: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                prompts: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Queue a successful response
        pub fn respond(self, text: impl Into<String>) -> Self {
            self.push(Duration::ZERO, Ok(text.into()))
        }

        /// Queue a successful response that arrives after `delay`
        pub fn respond_after(self, delay: Duration, text: impl Into<String>) -> Self {
            self.push(delay, Ok(text.into()))
        }

        /// Queue a failure
        pub fn fail(self, err: TransportError) -> Self {
            self.push(Duration::ZERO, Err(err))
        }

        fn push(self, delay: Duration, outcome: Result<String, TransportError>) -> Self {
            self.outcomes.lock().unwrap().push_back((delay, outcome));
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelTransport for MockTransport {
        async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockTransport::generate: called");
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.outcomes.lock().unwrap().pop_front();
            let Some((delay, outcome)) = next else {
                return Err(TransportError::InvalidResponse("No more mock responses".to_string()));
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_replays_in_order() {
            let transport = MockTransport::new().respond("first").fail(TransportError::Api {
                status: 500,
                message: "boom".to_string(),
            });

            assert_eq!(transport.generate("p1").await.unwrap(), "first");
            assert!(matches!(
                transport.generate("p2").await,
                Err(TransportError::Api { status: 500, .. })
            ));
            assert!(transport.generate("p3").await.is_err());
            assert_eq!(transport.call_count(), 3);
            assert_eq!(transport.prompts(), vec!["p1", "p2", "p3"]);
        }
    }
}
