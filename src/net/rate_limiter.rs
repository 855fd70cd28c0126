//! Request-gap rate limiting for every outbound HTTP call.
//!
//! A single [`RateLimiter`] is shared (via `Arc`) by the search client and the
//! PDF downloader. It enforces a minimum wall-clock gap between consecutive
//! requests, measured from the *end* of one request to the *start* of the next.
//!
//! [`RateLimiter::acquire`] returns a [`RatePermit`]. The caller performs its
//! request while holding the permit; dropping the permit records the end time.
//! Because the permit holds the limiter lock, concurrent workers are
//! serialized and can never exceed the configured ceiling.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use paperscout_core::net::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1100)));
//!
//! {
//!     let _permit = limiter.acquire().await;
//!     // ... send request and read the body
//! }
//!
//! // Waits until 1.1s have passed since the permit above was dropped.
//! let _permit = limiter.acquire().await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::{CUMULATIVE_DELAY_WARNING_THRESHOLD, MAX_RETRY_AFTER};

/// Shared minimum-gap rate limiter.
///
/// `RateLimiter` is `Send + Sync`; wrap it in `Arc` and hand clones to every
/// component that talks to the network.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between the end of one request and the start of the next.
    min_gap: Duration,

    /// Whether rate limiting is disabled (for `--rate-limit 0`).
    disabled: bool,

    /// End time of the most recent request.
    /// `None` until the first permit is released, so the first request is immediate.
    last_request_end: Arc<Mutex<Option<Instant>>>,

    /// Cumulative delay applied so far, in milliseconds.
    cumulative_delay_ms: AtomicU64,
}

/// Permission to perform exactly one outbound request.
///
/// Dropping the permit marks the end of the request.
#[derive(Debug)]
pub struct RatePermit {
    guard: Option<OwnedMutexGuard<Option<Instant>>>,
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.as_mut() {
            **guard = Some(Instant::now());
        }
    }
}

impl RateLimiter {
    /// Creates a rate limiter enforcing `min_gap` between requests.
    #[must_use]
    #[instrument(skip_all, fields(gap_ms = min_gap.as_millis()))]
    pub fn new(min_gap: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            min_gap,
            disabled: min_gap.is_zero(),
            last_request_end: Arc::new(Mutex::new(None)),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a disabled rate limiter that applies no delays.
    #[must_use]
    pub fn disabled() -> Self {
        debug!("creating disabled rate limiter");
        Self::new(Duration::ZERO)
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured minimum gap.
    #[must_use]
    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Returns the total delay this limiter has imposed so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    /// Waits until a request may start and returns a permit for it.
    ///
    /// The first request proceeds immediately. Later requests wait until
    /// `min_gap` has elapsed since the previous permit was dropped.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> RatePermit {
        if self.disabled {
            return RatePermit { guard: None };
        }

        let guard = Arc::clone(&self.last_request_end).lock_owned().await;

        if let Some(last_end) = *guard {
            let elapsed = last_end.elapsed();
            if elapsed < self.min_gap {
                let delay = self.min_gap.saturating_sub(elapsed);
                let cumulative = self.add_cumulative_delay(delay);

                debug!(
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying rate limit delay"
                );
                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                    warn!(
                        cumulative_delay_secs = cumulative.as_secs(),
                        "excessive rate limiting - consider lowering the request volume"
                    );
                }

                tokio::time::sleep(delay).await;
            }
        } else {
            debug!("first request - no delay");
        }

        RatePermit { guard: Some(guard) }
    }

    /// Records a server-mandated delay (from a Retry-After header).
    #[instrument(skip(self))]
    pub fn record_rate_limit(&self, delay: Duration) {
        let cumulative = self.add_cumulative_delay(delay);
        debug!(
            delay_ms = delay.as_millis(),
            cumulative_ms = cumulative.as_millis(),
            "recorded server rate limit"
        );
        if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
            warn!(
                cumulative_delay_secs = cumulative.as_secs(),
                "excessive server rate limiting - service may be under heavy load"
            );
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports integer seconds (`120`) and HTTP-dates
/// (`Wed, 21 Oct 2025 07:28:00 GMT`). Values above one hour are capped.
///
/// ```
/// use std::time::Duration;
/// use paperscout_core::net::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let Ok(seconds) = u64::try_from(seconds) else {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        };
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    let Ok(datetime) = httpdate::parse_http_date(header_value) else {
        debug!(header_value, "unparseable Retry-After value");
        return None;
    };

    match datetime.duration_since(std::time::SystemTime::now()) {
        Ok(duration) if duration > MAX_RETRY_AFTER => {
            warn!(
                delay_secs = duration.as_secs(),
                "Retry-After date exceeds maximum, capping at 1 hour"
            );
            Some(MAX_RETRY_AFTER)
        }
        Ok(duration) => Some(duration),
        Err(_) => Some(Duration::ZERO),
    }
}
