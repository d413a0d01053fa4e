use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_HTTP_TIMEOUT_SECONDS, endpoints, env_vars, rate_limits, retry,
};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the aggregation layer.
/// Every field has a default so a missing config file still yields a working setup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the NHL stats API, including the scheme.
    #[serde(default = "default_nhl_api_base")]
    pub nhl_api_base: String,
    /// HTTP timeout in seconds for upstream requests. Defaults to 10 seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Extra attempts for transient upstream failures (timeouts, 429, 5xx).
    #[serde(default = "default_http_max_retries")]
    pub http_max_retries: u32,
    /// Path to the log file. If not specified, logs go to the default log directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// Path of the JSON file holding tokens and the local session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Maximum number of cache entries before least recently used ones are evicted.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default)]
    pub fantasy: FantasyConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

/// OAuth application and endpoints of the fantasy provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FantasyConfig {
    pub api_base: String,
    pub auth_url: String,
    pub token_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    /// League used for the fantasy half of combined player lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_league_key: Option<String>,
}

impl Default for FantasyConfig {
    fn default() -> Self {
        Self {
            api_base: endpoints::FANTASY_API_BASE.to_string(),
            auth_url: endpoints::FANTASY_AUTH_URL.to_string(),
            token_url: endpoints::FANTASY_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            redirect_uri: endpoints::FANTASY_REDIRECT_URI.to_string(),
            scope: endpoints::FANTASY_SCOPE.to_string(),
            default_league_key: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NewsConfig {
    pub rotowire_api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotowire_api_key: Option<String>,
    pub espn_api_base: String,
    pub news_api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_api_key: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            rotowire_api_base: endpoints::ROTOWIRE_API_BASE.to_string(),
            rotowire_api_key: None,
            espn_api_base: endpoints::ESPN_API_BASE.to_string(),
            news_api_base: endpoints::NEWS_API_BASE.to_string(),
            news_api_key: None,
        }
    }
}

/// Per-minute request budgets
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub nhl_per_minute: u32,
    pub fantasy_per_minute: u32,
    /// Suspend callers until the window resets instead of failing them
    pub delay_when_exhausted: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            nhl_per_minute: rate_limits::NHL_REQUESTS_PER_MINUTE,
            fantasy_per_minute: rate_limits::FANTASY_REQUESTS_PER_MINUTE,
            delay_when_exhausted: true,
        }
    }
}

fn default_nhl_api_base() -> String {
    endpoints::NHL_API_BASE.to_string()
}

/// Default HTTP timeout in seconds
fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_http_max_retries() -> u32 {
    retry::MAX_ATTEMPTS
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nhl_api_base: default_nhl_api_base(),
            http_timeout_seconds: default_http_timeout(),
            http_max_retries: default_http_max_retries(),
            log_file_path: None,
            storage_path: None,
            cache_capacity: default_cache_capacity(),
            fantasy: FantasyConfig::default(),
            news: NewsConfig::default(),
            rate_limits: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// A missing file yields the defaults. Environment variables override file values.
    ///
    /// # Environment Variables
    /// - `RINKSIDE_NHL_API_BASE` - Override the NHL stats API base URL
    /// - `RINKSIDE_LOG_FILE` - Override log file path
    /// - `RINKSIDE_HTTP_TIMEOUT` - Override HTTP timeout in seconds (default: 10)
    /// - `RINKSIDE_FANTASY_CLIENT_ID`, `RINKSIDE_FANTASY_CLIENT_SECRET`,
    ///   `RINKSIDE_FANTASY_REDIRECT_URI` - Fantasy OAuth application
    /// - `RINKSIDE_ROTOWIRE_API_KEY`, `RINKSIDE_NEWS_API_KEY` - News source keys
    /// - `RINKSIDE_STORAGE_PATH` - Override the token/session storage file
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            Self::load_from_path(&config_path).await?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps an environment variable name to its value.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(env_vars::NHL_API_BASE) {
            self.nhl_api_base = base;
        }
        if let Some(log_file_path) = lookup(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }
        if let Some(timeout) = lookup(env_vars::HTTP_TIMEOUT).and_then(|s| s.parse::<u64>().ok()) {
            self.http_timeout_seconds = timeout;
        }
        if let Some(client_id) = lookup(env_vars::FANTASY_CLIENT_ID) {
            self.fantasy.client_id = Some(client_id);
        }
        if let Some(client_secret) = lookup(env_vars::FANTASY_CLIENT_SECRET) {
            self.fantasy.client_secret = Some(client_secret);
        }
        if let Some(redirect_uri) = lookup(env_vars::FANTASY_REDIRECT_URI) {
            self.fantasy.redirect_uri = redirect_uri;
        }
        if let Some(key) = lookup(env_vars::ROTOWIRE_API_KEY) {
            self.news.rotowire_api_key = Some(key);
        }
        if let Some(key) = lookup(env_vars::NEWS_API_KEY) {
            self.news.news_api_key = Some(key);
        }
        if let Some(storage_path) = lookup(env_vars::STORAGE_PATH) {
            self.storage_path = Some(storage_path);
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Storage file from the config, or the platform default next to the config file.
    pub fn resolved_storage_path(&self) -> String {
        self.storage_path
            .clone()
            .unwrap_or_else(paths::get_storage_path)
    }

    /// Saves configuration to a custom file path, creating the parent directory if needed.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path without applying environment overrides.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
