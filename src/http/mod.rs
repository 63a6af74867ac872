//! HTTP client module
//!
//! The resilient transport used by every remote call.
//!
//! # Features
//!
//! - **Automatic Retries**: transient statuses (408, 429, 500, 502, 503, 504),
//!   timeouts and connection errors are retried within an attempt budget
//! - **Retry-After**: server hints take precedence over computed backoff
//! - **Backoff Strategies**: Constant, linear, and exponential, with optional jitter
//! - **Rate Limiting**: Optional token bucket limiter using governor

mod client;
mod rate_limit;

pub use client::{ensure_success, HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
