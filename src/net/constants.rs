//! Constants shared by the network layer (timeouts, rate limiting).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for search API calls.
pub const SEARCH_READ_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for PDF downloads (5 minutes for large files).
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 300;

/// Default minimum gap between consecutive outbound requests, in milliseconds.
///
/// The public Semantic Scholar tier allows roughly one request per second.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1100;

/// Warning threshold for cumulative rate limit delay (30 seconds).
pub const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After header value (1 hour).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);
