//! Shared HTTP client construction.

use std::time::Duration;

/// HTTP client used by every provider.
///
/// 30s connect timeout, 60s request timeout, rustls TLS,
/// `lectern/{version}` user-agent, redirect limit 10.
#[must_use]
pub fn default_client() -> reqwest::Client {
    builder().build().unwrap_or_else(|e| {
        tracing::warn!("falling back to an unconfigured HTTP client: {e}");
        reqwest::Client::new()
    })
}

fn builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
}
