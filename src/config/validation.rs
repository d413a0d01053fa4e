use super::Config;
use crate::error::AppError;
use std::path::Path;

/// Validates the configuration settings
///
/// # Validation Rules
/// - Every base URL must be non-empty and start with `http://` or `https://`
/// - Request budgets and the HTTP timeout must be greater than zero
/// - Cache capacity must be greater than zero
/// - If a log file path is provided, it cannot be empty and its parent directory
///   must exist or be creatable
pub fn validate_config(config: &Config) -> Result<(), AppError> {
    let base_urls = [
        ("nhl_api_base", config.nhl_api_base.as_str()),
        ("fantasy.api_base", config.fantasy.api_base.as_str()),
        ("fantasy.auth_url", config.fantasy.auth_url.as_str()),
        ("fantasy.token_url", config.fantasy.token_url.as_str()),
        ("news.rotowire_api_base", config.news.rotowire_api_base.as_str()),
        ("news.espn_api_base", config.news.espn_api_base.as_str()),
        ("news.news_api_base", config.news.news_api_base.as_str()),
    ];
    for (name, url) in base_urls {
        validate_base_url(name, url)?;
    }

    if config.http_timeout_seconds == 0 {
        return Err(AppError::config_error("HTTP timeout must be at least 1 second"));
    }
    if config.cache_capacity == 0 {
        return Err(AppError::config_error("Cache capacity cannot be zero"));
    }
    if config.rate_limits.nhl_per_minute == 0 || config.rate_limits.fantasy_per_minute == 0 {
        return Err(AppError::config_error(
            "Rate limit budgets must allow at least one request per minute",
        ));
    }

    if let Some(log_path) = &config.log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        if let Some(parent) = Path::new(log_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_base_url(name: &str, url: &str) -> Result<(), AppError> {
    if url.is_empty() {
        return Err(AppError::config_error(format!("{name} cannot be empty")));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::config_error(format!(
            "{name} must start with http:// or https://, got '{url}'"
        )));
    }
    Ok(())
}
