//! Shared HTTP transport for provider clients.
//!
//! All provider clients reuse a single `reqwest::Client` so that the 2N+1 calls of a pipeline
//! run share pooled connections instead of paying for DNS and TLS on every request.

use lazy_static::lazy_static;
use std::time::Duration;

lazy_static! {
    static ref SHARED_HTTP_CLIENT: reqwest::Client = build_pooled_client();
}

/// Returns the process-wide pooled HTTP client.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Creates a reqwest client with connection pooling settings:
/// - `pool_max_idle_per_host(10)`
/// - `pool_idle_timeout(90s)`
/// - `tcp_keepalive(60s)`
/// - `connect_timeout(30s)`
///
/// No overall request timeout is set; a completion call runs until the service answers or the
/// connection fails.
fn build_pooled_client() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|err| {
            log::warn!(
                "roomcouncil::clients::common: falling back to default HTTP client: {}",
                err
            );
            reqwest::Client::new()
        })
}

/// Join a base URL and a path without doubling or dropping the slash between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
