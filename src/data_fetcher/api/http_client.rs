//! HTTP client creation and configuration utilities

use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

/// Creates the shared HTTP client with connection pooling and a request timeout.
///
/// One client is built per [`crate::ApiManager`] and cloned into every provider
/// client, so all providers share a single connection pool.
pub fn create_http_client_with_timeout(timeout_seconds: u64) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_max_idle_per_host(crate::constants::HTTP_POOL_MAX_IDLE_PER_HOST)
        .user_agent(concat!("rinkside/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::config_error(format!("Failed to build HTTP client: {e}")))
}

/// Creates an HTTP client for testing with default timeout
#[cfg(test)]
pub fn create_test_http_client() -> Client {
    create_http_client_with_timeout(crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS)
        .expect("Failed to create test HTTP client")
}
