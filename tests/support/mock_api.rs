//! Loopback stand-in for the Semantic Scholar API and the PDF hosts it links to.
//!
//! Some sandboxes cannot bind a loopback port. Tests there are skipped with a
//! note on stderr, unless `PAPERSCOUT_STRICT_NET_TESTS` is set, in which case
//! they fail.

use std::net::{Ipv4Addr, TcpListener};

use wiremock::MockServer;

/// Makes a missing loopback port a test failure instead of a skip.
pub const STRICT_ENV: &str = "PAPERSCOUT_STRICT_NET_TESTS";

/// Path prefix the search client is pointed at, mirroring the real API root.
pub const API_ROOT: &str = "/graph/v1";

fn loopback_available() -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).is_ok()
}

fn strict() -> bool {
    std::env::var(STRICT_ENV)
        .is_ok_and(|value| !matches!(value.trim(), "" | "0" | "false" | "no"))
}

/// Starts a mock API, or returns `None` when no loopback port can be bound.
pub async fn start_mock_api() -> Option<MockServer> {
    if loopback_available() {
        return Some(MockServer::start().await);
    }
    assert!(
        !strict(),
        "no loopback port for the mock API and {STRICT_ENV} is set"
    );
    eprintln!("skipping: no loopback port for the mock API (set {STRICT_ENV}=1 to fail instead)");
    None
}

/// `base_url` for a search client talking to `server`.
pub fn api_base_url(server: &MockServer) -> String {
    format!("{}{API_ROOT}", server.uri())
}

/// Absolute URL of a file served by `server`, e.g. an open-access PDF.
pub fn asset_url(server: &MockServer, file: &str) -> String {
    format!("{}/{}", server.uri(), file.trim_start_matches('/'))
}
