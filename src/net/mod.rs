//! Network plumbing shared by the search client and the PDF downloader.
//!
//! - [`RateLimiter`]: one shared minimum-gap limiter for every outbound request
//! - [`RetryPolicy`]: bounded exponential backoff with jitter
//! - [`build_client`]: reqwest client with explicit timeouts

pub mod constants;
mod http;
pub mod rate_limiter;
mod retry;

pub use http::{build_client, default_user_agent};
pub use rate_limiter::{RateLimiter, RatePermit, parse_retry_after};
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_http_status,
};
