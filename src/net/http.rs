//! HTTP client construction and the shared User-Agent string.

use std::time::Duration;

use reqwest::Client;

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/paperscout";

/// User-Agent for all outbound requests (identifies the tool).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("paperscout/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}

/// Builds a reqwest client with explicit connect and total timeouts.
///
/// # Errors
///
/// Returns the underlying reqwest error if the TLS backend cannot be initialized.
pub fn build_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .gzip(true)
        .user_agent(default_user_agent())
        .build()
}
