use crate::data_fetcher::models::Provider;
use std::time::Duration;
use thiserror::Error;

/// Classified reason an upstream HTTP call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("not found (404): {url}")]
    NotFound { url: String },

    #[error("unauthorized (401): {url}")]
    Unauthorized { url: String },

    #[error("rate limited (429): {url}")]
    RateLimited {
        url: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("client error ({status}): {message} (URL: {url})")]
    ClientError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("server error ({status}): {message} (URL: {url})")]
    ServerError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("service unavailable ({status}): {message} (URL: {url})")]
    ServiceUnavailable {
        status: u16,
        message: String,
        url: String,
    },

    #[error("network timeout while fetching: {url}")]
    Timeout { url: String },

    #[error("connection failed to: {url} - {message}")]
    Connection { url: String, message: String },

    #[error("malformed JSON: {message} (URL: {url})")]
    MalformedJson { message: String, url: String },

    #[error("unexpected data structure: {message} (URL: {url})")]
    UnexpectedStructure { message: String, url: String },

    #[error("empty or missing data: {message} (URL: {url})")]
    NoData { message: String, url: String },

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchFailure {
    /// Maps a non-success HTTP status to a failure kind
    pub fn from_status(status: u16, reason: impl Into<String>, url: impl Into<String>) -> Self {
        let message = reason.into();
        let url = url.into();
        match status {
            401 => Self::Unauthorized { url },
            404 => Self::NotFound { url },
            429 => Self::RateLimited {
                url,
                retry_after_seconds: None,
            },
            502 | 503 => Self::ServiceUnavailable {
                status,
                message,
                url,
            },
            400..=499 => Self::ClientError {
                status,
                message,
                url,
            },
            _ => Self::ServerError {
                status,
                message,
                url,
            },
        }
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchFailure::Timeout { .. }
                | FetchFailure::Connection { .. }
                | FetchFailure::ServerError { .. }
                | FetchFailure::ServiceUnavailable { .. }
                | FetchFailure::RateLimited { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream HTTP or network failure for one provider resource
    #[error("{provider} request for {resource} failed: {cause}")]
    Provider {
        provider: Provider,
        resource: String,
        cause: FetchFailure,
    },

    /// Request budget exhausted and the limiter is configured to reject
    #[error("Rate limit exceeded for {provider}, window resets in {retry_after:?}")]
    RateLimitExceeded {
        provider: Provider,
        retry_after: Duration,
    },

    /// OAuth code exchange or token refresh was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not authenticated with {provider}")]
    NotAuthenticated { provider: Provider },

    /// The provider rejected a freshly refreshed token; the session was torn down
    #[error("Session expired, re-authentication with the fantasy provider is required")]
    ReauthenticationRequired,

    /// A cache producer failed; the key stays unset
    #[error("Failed to fetch data for cache key {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Cached value for key {key} has an unexpected type")]
    CacheTypeMismatch { key: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),
}

impl AppError {
    /// Create a provider error for a resource
    pub fn provider(provider: Provider, resource: impl Into<String>, cause: FetchFailure) -> Self {
        Self::Provider {
            provider,
            resource: resource.into(),
            cause,
        }
    }

    /// Create an authentication error with context
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error with context
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Strips the cache wrapper and returns the error the producer raised
    pub fn into_upstream(self) -> AppError {
        match self {
            AppError::Fetch { source, .. } => source.into_upstream(),
            other => other,
        }
    }

    /// Check if error is retryable (network issues, server errors, rate limits)
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Provider { cause, .. } => cause.is_retryable(),
            AppError::RateLimitExceeded { .. } => true,
            AppError::Fetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Check if error indicates the upstream resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::Provider { cause, .. } => matches!(
                cause,
                FetchFailure::NotFound { .. } | FetchFailure::NoData { .. }
            ),
            AppError::Fetch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if the caller has to send the user through the OAuth flow again
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AppError::NotAuthenticated { .. } | AppError::ReauthenticationRequired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_helper() {
        let error = AppError::config_error("Invalid configuration");
        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_log_setup_error_helper() {
        let error = AppError::log_setup_error("Failed to initialize logger");
        assert!(matches!(error, AppError::LogSetup(_)));
        assert_eq!(
            error.to_string(),
            "Log setup error: Failed to initialize logger"
        );
    }

    #[test]
    fn test_provider_error_display() {
        let error = AppError::provider(
            Provider::Nhl,
            "roster/EDM",
            FetchFailure::from_status(500, "Internal Server Error", "https://api.example.com"),
        );
        assert_eq!(
            error.to_string(),
            "nhl request for roster/EDM failed: server error (500): Internal Server Error (URL: https://api.example.com)"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            FetchFailure::from_status(401, "Unauthorized", "u"),
            FetchFailure::Unauthorized { .. }
        ));
        assert!(matches!(
            FetchFailure::from_status(404, "Not Found", "u"),
            FetchFailure::NotFound { .. }
        ));
        assert!(matches!(
            FetchFailure::from_status(429, "Too Many Requests", "u"),
            FetchFailure::RateLimited { .. }
        ));
        assert!(matches!(
            FetchFailure::from_status(503, "Service Unavailable", "u"),
            FetchFailure::ServiceUnavailable { status: 503, .. }
        ));
        assert!(matches!(
            FetchFailure::from_status(418, "I'm a teapot", "u"),
            FetchFailure::ClientError { status: 418, .. }
        ));
        assert!(matches!(
            FetchFailure::from_status(500, "Internal Server Error", "u"),
            FetchFailure::ServerError { status: 500, .. }
        ));
    }

    #[test]
    fn test_retryable_errors() {
        let timeout = AppError::provider(
            Provider::Nhl,
            "teams",
            FetchFailure::Timeout {
                url: "https://api.example.com".to_string(),
            },
        );
        assert!(timeout.is_retryable());

        let not_found = AppError::provider(
            Provider::Nhl,
            "teams",
            FetchFailure::NotFound {
                url: "https://api.example.com".to_string(),
            },
        );
        assert!(!not_found.is_retryable());
        assert!(not_found.is_not_found());
        assert!(!AppError::auth_error("denied").is_retryable());
    }

    #[test]
    fn test_into_upstream_unwraps_nested_fetch_errors() {
        let upstream = AppError::provider(
            Provider::Fantasy,
            "league/nhl.l.1/settings",
            FetchFailure::NotFound {
                url: "https://api.example.com".to_string(),
            },
        );
        let wrapped = AppError::Fetch {
            key: "outer".to_string(),
            source: Box::new(AppError::Fetch {
                key: "inner".to_string(),
                source: Box::new(upstream),
            }),
        };
        assert!(wrapped.is_not_found());
        match wrapped.into_upstream() {
            AppError::Provider {
                provider, resource, ..
            } => {
                assert_eq!(provider, Provider::Fantasy);
                assert_eq!(resource, "league/nhl.l.1/settings");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_requires_login() {
        assert!(
            AppError::NotAuthenticated {
                provider: Provider::Fantasy
            }
            .requires_login()
        );
        assert!(AppError::ReauthenticationRequired.requires_login());
        assert!(!AppError::auth_error("bad code").requires_login());
    }
}
