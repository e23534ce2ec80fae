//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving a tins configuration file.
///
/// Bad individual values are not errors: they are logged and replaced by the
/// compiled default. Only file-system failures and malformed TOML end up here.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    ReadFile {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be written.
    #[error("cannot write config file '{path}': {source}")]
    WriteFile {
        /// Path that was written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML.
    #[error("config is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("cannot render config as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A config directory could not be created.
    #[error("cannot create config directory '{path}': {source}")]
    CreateDir {
        /// Directory that was created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Wrap a read failure for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Wrap a write failure for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Wrap a directory creation failure for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
