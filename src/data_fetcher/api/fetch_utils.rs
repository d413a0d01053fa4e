//! Generic HTTP fetching with retry logic and failure classification

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::constants::retry;
use crate::data_fetcher::models::Provider;
use crate::data_fetcher::rate_limiter::RateLimiter;
use crate::error::{AppError, FetchFailure};

/// How transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Single attempt, used where a caller handles failures itself
    pub fn none() -> Self {
        Self::with_max_retries(0)
    }
}

/// Provider resource a request is made for, and the limiter it is charged to
#[derive(Clone, Copy)]
pub(crate) struct Upstream<'a> {
    pub provider: Provider,
    pub resource: &'a str,
    /// One permit is taken before every attempt, retries included
    pub limiter: Option<&'a RateLimiter>,
}

impl<'a> Upstream<'a> {
    pub fn metered(provider: Provider, resource: &'a str, limiter: &'a RateLimiter) -> Self {
        Self {
            provider,
            resource,
            limiter: Some(limiter),
        }
    }

    pub fn unmetered(provider: Provider, resource: &'a str) -> Self {
        Self {
            provider,
            resource,
            limiter: None,
        }
    }

    async fn admit(&self) -> Result<(), AppError> {
        match self.limiter {
            Some(limiter) => limiter.acquire(self.provider).await,
            None => Ok(()),
        }
    }

    fn failed(&self, cause: FetchFailure) -> AppError {
        AppError::provider(self.provider, self.resource, cause)
    }
}

/// Sends the request built by `build` and parses a JSON body into `T`.
///
/// `build` is called once per attempt. Timeouts, connection failures, 429 and
/// 5xx responses are retried with exponential backoff, honoring `Retry-After`
/// up to [`retry::MAX_RETRY_AFTER_SECONDS`]. 401 is never retried here;
/// authenticated callers refresh and replay themselves.
#[instrument(skip(build, policy, upstream), fields(provider = %upstream.provider, resource = upstream.resource))]
pub(crate) async fn fetch_json<T, F>(
    build: F,
    url: &str,
    policy: &RetryPolicy,
    upstream: Upstream<'_>,
) -> Result<T, AppError>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let response = send_with_retry(build, url, policy, upstream).await?;
    let text = read_success_body(response, url)
        .await
        .map_err(|cause| upstream.failed(cause))?;
    parse_json(&text, url).map_err(|cause| upstream.failed(cause))
}

/// Retry loop shared by every fetch. Returns the first response that is not
/// a retryable failure, or the classified error once attempts are exhausted.
/// A limiter rejection before any attempt ends the loop with that error.
pub(crate) async fn send_with_retry<F>(
    build: F,
    url: &str,
    policy: &RetryPolicy,
    upstream: Upstream<'_>,
) -> Result<Response, AppError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0u32;
    let mut backoff = policy.base_delay;
    loop {
        upstream.admit().await?;
        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                if (status.as_u16() == 429 || status.is_server_error())
                    && attempt < policy.max_retries
                {
                    let wait = retry_after(&resp)
                        .map(clamp_retry_after)
                        .unwrap_or(backoff);
                    warn!(
                        "Transient {} from {}. Retrying in {:?} (attempt {}/{})",
                        status,
                        url,
                        wait,
                        attempt + 1,
                        policy.max_retries
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    backoff = backoff.saturating_mul(2);
                    continue;
                }
                return Ok(resp);
            }
            Err(e) => {
                if (e.is_timeout() || e.is_connect()) && attempt < policy.max_retries {
                    warn!(
                        "Request error {} for {}. Retrying in {:?} (attempt {}/{})",
                        e,
                        url,
                        backoff,
                        attempt + 1,
                        policy.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    backoff = backoff.saturating_mul(2);
                    continue;
                }
                error!("Request failed for URL {}: {}", url, e);
                let cause = if e.is_timeout() {
                    FetchFailure::Timeout {
                        url: url.to_string(),
                    }
                } else if e.is_connect() {
                    FetchFailure::Connection {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    FetchFailure::Request(e.to_string())
                };
                return Err(upstream.failed(cause));
            }
        }
    }
}

/// Maps a non-2xx response to its failure kind, otherwise returns the body text
pub(crate) async fn read_success_body(response: Response, url: &str) -> Result<String, FetchFailure> {
    let status = response.status();
    debug!("Response status: {status}");

    if !status.is_success() {
        let status_code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or("Unknown error");
        error!("HTTP {} - {} (URL: {})", status_code, reason, url);

        let failure = match status_code {
            429 => FetchFailure::RateLimited {
                url: url.to_string(),
                retry_after_seconds: retry_after(&response).map(|d| d.as_secs()),
            },
            _ => FetchFailure::from_status(status_code, reason, url),
        };
        return Err(failure);
    }

    let text = response.text().await.map_err(|e| {
        error!("Failed to read response text from URL {}: {}", url, e);
        FetchFailure::Request(e.to_string())
    })?;
    debug!("Response length: {} bytes", text.len());
    Ok(text)
}

/// Parses a JSON body, telling malformed payloads apart from unexpected shapes
pub(crate) fn parse_json<T: DeserializeOwned>(text: &str, url: &str) -> Result<T, FetchFailure> {
    serde_json::from_str::<T>(text).map_err(|e| {
        error!("Failed to parse API response: {} (URL: {})", e, url);
        let preview: String = text.chars().take(200).collect();
        error!("Response text (first 200 chars): {preview}");

        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            FetchFailure::NoData {
                message: "Response body is empty".to_string(),
                url: url.to_string(),
            }
        } else if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            FetchFailure::MalformedJson {
                message: "Response is not valid JSON".to_string(),
                url: url.to_string(),
            }
        } else {
            FetchFailure::UnexpectedStructure {
                message: e.to_string(),
                url: url.to_string(),
            }
        }
    })
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Caps a server-requested wait so one response cannot stall a cache key for long
fn clamp_retry_after(wait: Duration) -> Duration {
    wait.min(Duration::from_secs(retry::MAX_RETRY_AFTER_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    fn test_upstream() -> Upstream<'static> {
        Upstream::unmetered(Provider::Nhl, "test")
    }

    fn cause_of<T>(result: Result<T, AppError>) -> FetchFailure {
        match result {
            Err(AppError::Provider { cause, .. }) => cause,
            Err(other) => panic!("expected a provider error, got {other:?}"),
            Ok(_) => panic!("expected a provider error, got a payload"),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
            .mount(&mock_server)
            .await;

        let client = create_test_http_client();
        let url = format!("{}/ok", mock_server.uri());
        let payload: Payload = fetch_json(|| client.get(&url), &url, &fast_policy(0), test_upstream())
            .await
            .unwrap();
        assert_eq!(payload, Payload { value: 7 });
    }

    #[tokio::test]
    async fn test_status_classification() {
        let mock_server = MockServer::start().await;
        for (route, status) in [("/missing", 404), ("/denied", 401), ("/bad", 400), ("/down", 503)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;
        }

        let client = create_test_http_client();
        let fetch = |route: &str| {
            let url = format!("{}{route}", mock_server.uri());
            let client = client.clone();
            async move {
                fetch_json::<Payload, _>(|| client.get(&url), &url, &fast_policy(0), test_upstream())
                    .await
            }
        };

        assert!(matches!(cause_of(fetch("/missing").await), FetchFailure::NotFound { .. }));
        assert!(matches!(cause_of(fetch("/denied").await), FetchFailure::Unauthorized { .. }));
        assert!(matches!(
            cause_of(fetch("/bad").await),
            FetchFailure::ClientError { status: 400, .. }
        ));
        assert!(matches!(
            cause_of(fetch("/down").await),
            FetchFailure::ServiceUnavailable { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 1})))
            .mount(&mock_server)
            .await;

        let client = create_test_http_client();
        let url = format!("{}/flaky", mock_server.uri());
        let payload: Payload = fetch_json(|| client.get(&url), &url, &fast_policy(3), test_upstream())
            .await
            .unwrap();
        assert_eq!(payload.value, 1);
    }

    #[tokio::test]
    async fn test_rate_limited_keeps_retry_after() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = create_test_http_client();
        let url = format!("{}/limited", mock_server.uri());
        let result =
            fetch_json::<Payload, _>(|| client.get(&url), &url, &fast_policy(0), test_upstream()).await;
        assert!(matches!(
            cause_of(result),
            FetchFailure::RateLimited {
                retry_after_seconds: Some(30),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_every_retry_takes_a_permit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .mount(&mock_server)
            .await;

        let limiter = RateLimiter::new(2, 30, false);
        let client = create_test_http_client();
        let url = format!("{}/teams", mock_server.uri());
        let result = fetch_json::<Payload, _>(
            || client.get(&url),
            &url,
            &fast_policy(3),
            Upstream::metered(Provider::Nhl, "teams", &limiter),
        )
        .await;

        // Third attempt is refused by the limiter before it reaches the server
        assert!(matches!(
            result,
            Err(AppError::RateLimitExceeded {
                provider: Provider::Nhl,
                ..
            })
        ));
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let nhl = limiter
            .status()
            .await
            .into_iter()
            .find(|s| s.provider == Provider::Nhl)
            .unwrap();
        assert_eq!(nhl.used, 2);
    }

    #[test]
    fn test_retry_after_is_capped() {
        assert_eq!(
            clamp_retry_after(Duration::from_secs(3600)),
            Duration::from_secs(retry::MAX_RETRY_AFTER_SECONDS)
        );
        assert_eq!(clamp_retry_after(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_json_classification() {
        let url = "http://example.test";
        assert!(matches!(
            parse_json::<Payload>("", url),
            Err(FetchFailure::NoData { .. })
        ));
        assert!(matches!(
            parse_json::<Payload>("<html>", url),
            Err(FetchFailure::MalformedJson { .. })
        ));
        assert!(matches!(
            parse_json::<Payload>(r#"{"other": true}"#, url),
            Err(FetchFailure::UnexpectedStructure { .. })
        ));
    }
}
