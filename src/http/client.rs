//! HTTP client with retry and rate limiting
//!
//! Provides the resilient transport every remote call goes through:
//! - Automatic retries on the transient status set (408, 429, 5xx gateway codes)
//! - Server `Retry-After` hints, falling back to configurable backoff
//! - A per-request timeout distinct from the retry budget
//! - Optional client-side rate limiting

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{is_retryable_status, Error, Result};
use crate::types::{BackoffType, Method, StringMap};
use rand::Rng;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum number of sends per request (first try included)
    pub max_attempts: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff, also caps server hints
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Randomize computed backoff in `[0, delay]`
    pub jitter: bool,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            max_attempts: 60,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(32),
            backoff_type: BackoffType::Constant,
            jitter: false,
            rate_limit: None,
            default_headers: StringMap::new(),
            user_agent: format!("owner-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Enable or disable jitter on computed backoff
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max attempts for this request
    pub max_attempts: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max attempts
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// HTTP client with retry and rate limiting
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::new(AuthConfig::None),
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.set_authenticator(auth_config);
        Ok(client)
    }

    /// Set the authenticator
    pub fn set_authenticator(&mut self, auth_config: AuthConfig) {
        self.authenticator = Authenticator::new(auth_config);
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send a request, retrying transient failures.
    ///
    /// Any status outside the transient set is returned as-is on the first
    /// attempt that produces it, success or not. Callers decide what a
    /// non-2xx status means for them (see [`ensure_success`]).
    ///
    /// Once the budget is spent the error is `Timeout` if the final attempt
    /// timed out, `RetryExhausted` otherwise.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let method: reqwest::Method = method.into();
        let max_attempts = config.max_attempts.unwrap_or(self.config.max_attempts).max(1);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut last_status = None;
        let mut timed_out = false;

        for attempt in 1..=max_attempts {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let req = self.build_request(method.clone(), &full_url, &config, timeout);

            let delay = match req.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !is_retryable_status(status) {
                        debug!("{} {} -> {}", method, full_url, status);
                        return Ok(response);
                    }
                    last_status = Some(status);
                    timed_out = false;
                    let delay = self.retry_delay(attempt, extract_retry_after(&response));
                    warn!(
                        "Request failed with {}, attempt {}/{}, retrying in {:?}",
                        status, attempt, max_attempts, delay
                    );
                    delay
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    timed_out = e.is_timeout();
                    let delay = self.retry_delay(attempt, None);
                    warn!(
                        "Transport error ({}), attempt {}/{}, retrying in {:?}",
                        e, attempt, max_attempts, delay
                    );
                    delay
                }
                Err(e) => return Err(Error::Http(e)),
            };

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        if timed_out {
            return Err(Error::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Err(Error::RetryExhausted {
            attempts: max_attempts,
            last_status,
        })
    }

    /// Make a request, require a 2xx status and parse the JSON body.
    ///
    /// An empty body reads as `null`. A body that does not parse into `T`
    /// is a data-shape error rather than a transport one.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, url, config).await?;
        let text = ensure_success(response).await?.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| Error::data_shape(format!("invalid JSON body: {e}")))?
        };
        serde_json::from_value(value)
            .map_err(|e| Error::data_shape(format!("unexpected JSON body: {e}")))
    }

    fn build_request(
        &self,
        method: reqwest::Method,
        url: &str,
        config: &RequestConfig,
        timeout: Duration,
    ) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(ref body) = config.body {
            req = req.json(body);
        }

        self.authenticator.apply(req.timeout(timeout))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Delay before the next attempt: the server hint if present, otherwise
    /// the computed backoff. Always capped at `max_backoff`.
    pub fn retry_delay(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        let delay = server_hint.unwrap_or_else(|| self.calculate_backoff(attempt));
        std::cmp::min(delay, self.config.max_backoff)
    }

    /// Calculate backoff delay for a given attempt (1-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let attempt = attempt.max(1);
        let delay = match self.config.backoff_type {
            BackoffType::Constant => Some(initial),
            BackoffType::Linear => initial.checked_mul(attempt),
            BackoffType::Exponential => initial.checked_mul(2u32.saturating_pow(attempt - 1)),
        };
        let delay = std::cmp::min(
            delay.unwrap_or(self.config.max_backoff),
            self.config.max_backoff,
        );

        if self.config.jitter && !delay.is_zero() {
            let ms = delay.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=ms))
        } else {
            delay
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a non-2xx response into `Error::HttpStatus`
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http_status(status.as_u16(), body))
}

/// Extract a Retry-After header given in whole seconds
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
