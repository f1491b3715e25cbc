//! HTTP client factory with consistent timeout configuration.
//!
//! Every outbound call (identity provider, SMS delivery) goes through a
//! client built here, so no external dependency can stall a request
//! indefinitely.

use reqwest::Client;
use std::time::Duration;

/// Connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client with default timeouts.
///
/// Panics if the client cannot be built; acceptable for singleton
/// constructors since the gateway cannot function without outbound HTTP.
pub fn build_client() -> Client {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}
