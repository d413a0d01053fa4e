use std::path::{Path, PathBuf};

const APP_DIR: &str = "rinkside";

/// Platform config directory for the application, falling back to the
/// current directory when none is available.
fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(APP_DIR)
}

/// Returns the platform-specific path for the config file.
///
/// # Notes
/// - Uses platform-specific config directory (e.g., ~/.config on Linux)
/// - Falls back to current directory if config directory is unavailable
pub fn get_config_path() -> String {
    app_dir().join("config.toml").to_string_lossy().to_string()
}

/// Returns the platform-specific path for the log directory.
pub fn get_log_dir_path() -> String {
    app_dir().join("logs").to_string_lossy().to_string()
}

/// Default location of the token and session store
pub fn get_storage_path() -> String {
    app_dir().join("storage.json").to_string_lossy().to_string()
}
