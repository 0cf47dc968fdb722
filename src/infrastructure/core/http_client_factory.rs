use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

const MIN_BACKOFF: Duration = Duration::from_millis(100);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates an HTTP client with retry middleware for transient failures.
    ///
    /// `timeout` bounds each individual attempt; callers bound the whole call
    /// (retries included) themselves.
    pub fn create_client(timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let min_backoff = MIN_BACKOFF.min(timeout);
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(min_backoff, timeout.max(min_backoff))
            .build_with_max_retries(max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}
