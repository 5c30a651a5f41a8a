//! Shared HTTP plumbing for the vendor transports
//!
//! One attempt per request. Failures are mapped to [`TransportError`] and
//! handed back; retrying is the user's call.

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

use super::TransportError;

/// Fallback wait when a 429 carries no usable retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Build the shared HTTP client with the configured timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder().timeout(timeout).build().map_err(TransportError::Network)
}

/// Send a request once and map any non-success status
pub(crate) async fn send(request: RequestBuilder, timeout: Duration) -> Result<Response, TransportError> {
    let response = request.send().await.map_err(|e| {
        debug!(error = %e, "send: network error");
        TransportError::from_reqwest(e, timeout)
    })?;

    let status = response.status().as_u16();

    if status == 429 {
        debug!("send: rate limited (429)");
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        return Err(TransportError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        });
    }

    if !response.status().is_success() {
        debug!(%status, "send: API error");
        let text = response.text().await.unwrap_or_default();
        return Err(TransportError::Api { status, message: text });
    }

    debug!(%status, "send: success");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `reply` to every connection, counting connections
    async fn stub_server(reply: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{addr}/"), hits)
    }

    #[tokio::test]
    async fn test_transient_status_is_not_retried() {
        let (url, hits) = stub_server(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbusy",
        )
        .await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let err = send(client.get(&url), Duration::from_secs(5)).await.unwrap_err();

        assert!(
            matches!(err, TransportError::Api { status: 503, ref message } if message == "busy"),
            "expected Api 503, got: {err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let (url, hits) = stub_server(
            "HTTP/1.1 429 Too Many Requests\r\nretry-after: 12\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let err = send(client.get(&url), Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_passes_response_through() {
        let (url, _) = stub_server("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").await;
        let client = build_client(Duration::from_secs(5)).unwrap();

        let response = send(client.get(&url), Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let client = build_client(Duration::from_secs(5)).unwrap();

        let err = send(client.get(format!("http://{addr}/")), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "got: {err}");
    }
}
