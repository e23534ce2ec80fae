//! Platform-specific configuration paths.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/tins/` (Linux), `~/Library/Application Support/tins/` (macOS), `%APPDATA%\tins\` (Windows)
//! - **Config file**: `config.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use tins_config::paths;
//!
//! let path = paths::default_config_path();
//! println!("Config: {}", path.display());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "tins";

/// File name of the user configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/tins/`
/// - macOS: `~/Library/Application Support/tins/`
/// - Windows: `%APPDATA%\tins\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the configuration file read when no `--config` is given.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_config_dir_is_namespaced() {
        let dir = user_config_dir();
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn default_config_path_is_inside_config_dir() {
        let path = default_config_path();
        assert_eq!(path.parent(), Some(user_config_dir().as_path()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(CONFIG_FILE_NAME)
        );
    }
}
