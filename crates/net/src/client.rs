//! HTTP client with connection pooling and retry logic

use crate::retry::RetryPolicy;
use arcdl_errors::{Error, NetworkError};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub connect_timeout: Duration,
    /// Longest wait for response headers, and for each body chunk
    pub read_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: format!("arcdl/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        }
    }
}

impl NetConfig {
    /// Build from the `[network]` section of the configuration file
    #[must_use]
    pub fn from_config(config: &arcdl_config::NetworkConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy {
                max_attempts: config.retry_attempts.max(1),
                initial_delay: config.backoff_base(),
                max_delay: config.backoff_max(),
                ..RetryPolicy::default()
            },
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
///
/// Retryable statuses are retried with backoff; once attempts run out the
/// last response is returned as-is so the caller can surface its status.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
    cancel: CancellationToken,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Abort backoff sleeps when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent after all retry
    /// attempts. Error statuses are returned as responses.
    pub async fn get(&self, url: &Url) -> Result<Response, Error> {
        self.execute(Method::GET, url, HeaderMap::new()).await
    }

    /// Execute a GET request with extra headers
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent after all retry attempts.
    pub async fn get_with_headers(&self, url: &Url, headers: HeaderMap) -> Result<Response, Error> {
        self.execute(Method::GET, url, headers).await
    }

    /// Execute a HEAD request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent after all retry attempts.
    pub async fn head(&self, url: &Url) -> Result<Response, Error> {
        self.execute(Method::HEAD, url, HeaderMap::new()).await
    }

    /// Execute a request, retrying transient failures per the retry policy
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if cancelled while backing off, otherwise a
    /// `NetworkError` for the last transport failure.
    pub async fn execute(
        &self,
        method: Method,
        url: &Url,
        headers: HeaderMap,
    ) -> Result<Response, Error> {
        let policy = &self.config.retry;
        let max_attempts = if policy.allows_method(&method) {
            policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!(%method, %url, attempt, "sending request");
            let request = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .send();

            let outcome = match tokio::time::timeout(self.config.read_timeout, request).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(e),
                Err(_) => {
                    if attempt >= max_attempts {
                        return Err(NetworkError::Timeout {
                            url: url.to_string(),
                        }
                        .into());
                    }
                    self.backoff(attempt, None, "timed out waiting for response")
                        .await?;
                    attempt += 1;
                    continue;
                }
            };

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if attempt < max_attempts && policy.is_retryable_status(status) {
                        let retry_after = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.trim().parse::<u64>().ok());
                        self.backoff(attempt, retry_after, status.as_str()).await?;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt < max_attempts && Self::should_retry(&e) {
                        self.backoff(attempt, None, &e.to_string()).await?;
                        attempt += 1;
                        continue;
                    }
                    return Err(map_transport_error(&e, url).into());
                }
            }
        }
    }

    /// Sleep before retry number `retry`, aborting on cancellation
    async fn backoff(&self, retry: u32, retry_after: Option<u64>, reason: &str) -> Result<(), Error> {
        let delay = self.config.retry.delay_for_response(retry, retry_after);
        debug!(
            retry,
            max_attempts = self.config.retry.max_attempts,
            ?delay,
            reason,
            "retrying request"
        );
        self.sleep(delay).await
    }

    /// Sleep for `delay` unless cancelled first
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if the cancellation token fires.
    pub async fn sleep(&self, delay: Duration) -> Result<(), Error> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        !error.is_builder()
            && (error.is_timeout()
                || error.is_connect()
                || error.status().is_none_or(|s| s.is_server_error()))
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Convert a reqwest error into the matching `NetworkError`
pub(crate) fn map_transport_error(e: &reqwest::Error, url: &Url) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        NetworkError::ConnectionRefused(e.to_string())
    } else {
        NetworkError::DownloadFailed(e.to_string())
    }
}
