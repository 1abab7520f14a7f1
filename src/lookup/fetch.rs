//! Resilient outbound HTTP fetch with bounded exponential backoff
//!
//! Transient failures (HTTP 429/500/502/503/504 and connection-level
//! transport errors) are retried up to a fixed attempt count; everything else
//! propagates immediately. The delay before retry attempt n (1-indexed) is
//! `base_delay * 2^(n-1)`.

use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS};
use crate::lookup::error::FetchError;

/// Raw response from one HTTP attempt. Non-2xx statuses are data here, not
/// errors; the fetcher decides what to do with them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for performing a single GET request
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError>;
}

/// Transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("winget-scout")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Retry policy for one logical fetch
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

/// Wraps a [`Transport`] with the retry policy
pub struct RetryingFetcher {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_transport(Box::new(ReqwestTransport::new()), policy)
    }

    pub fn with_transport(transport: Box<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetch the body at `url`, retrying transient failures.
    ///
    /// After exhausting the attempt budget the last observed error is
    /// returned; no delay is applied after the final failed attempt.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_get(url, timeout).await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!(url, attempt, "fetch succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(err) => {
                    if attempt >= self.policy.max_attempts.max(1) || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.policy.base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        url,
                        attempt,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self.transport.get(url, timeout).await?;
        if !(200..300).contains(&response.status) {
            return Err(FetchError::Status {
                status: response.status,
            });
        }
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn ok(body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn status(status: u16) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status,
            body: String::new(),
        })
    }

    fn fetcher(transport: MockTransport, max_attempts: u32) -> RetryingFetcher {
        RetryingFetcher::with_transport(
            Box::new(transport),
            RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(500),
            },
        )
    }

    #[tokio::test]
    async fn get_returns_body_on_first_success() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_, _| ok("hello"));

        let result = fetcher(transport, 3).get("http://x", TIMEOUT).await;

        assert_eq!(result.unwrap(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn get_retries_503_twice_then_succeeds_with_backoff() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(2).returning(|_, _| status(503));
        transport
            .expect_get()
            .times(1)
            .returning(|_, _| ok("recovered"));

        let start = tokio::time::Instant::now();
        let result = fetcher(transport, 3).get("http://x", TIMEOUT).await;

        assert_eq!(result.unwrap(), "recovered");
        // 500ms before the first retry, 1000ms before the second
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn get_does_not_retry_404() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|_, _| status(404));

        let result = fetcher(transport, 3).get("http://x", TIMEOUT).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404 })));
    }

    #[tokio::test(start_paused = true)]
    async fn get_returns_last_error_after_exhausting_attempts() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(3).returning(|_, _| status(503));

        let start = tokio::time::Instant::now();
        let result = fetcher(transport, 3).get("http://x", TIMEOUT).await;

        assert!(matches!(result, Err(FetchError::Status { status: 503 })));
        // No delay after the final failed attempt
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn get_does_not_retry_malformed_response_errors() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_, _| Err(FetchError::InvalidResponse("truncated".into())));

        let result = fetcher(transport, 3).get("http://x", TIMEOUT).await;

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }
}
