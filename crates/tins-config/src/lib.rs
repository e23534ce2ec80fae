//! Configuration for the tins synthesizer.
//!
//! One TOML file covers the audio stream, the default envelope, the keyed
//! voices and the remote-control listener. Loading is tolerant: each key is
//! validated on its own and a bad value costs only that key, never the file.
//!
//! # Features
//!
//! - **SynthConfig**: typed sections with compiled defaults
//! - **Unit suffixes**: times as `"100ms"`, gains as `"-6dB"`
//! - **Paths**: platform-specific user config location
//!
//! # Example
//!
//! ```rust,no_run
//! use tins_config::{ConfigSource, SynthConfig};
//!
//! let (config, source) = SynthConfig::load_or_default(None)?;
//! if let ConfigSource::File(path) = &source {
//!     println!("loaded {}", path.display());
//! }
//! let settings = config.synth_settings();
//! # Ok::<(), tins_config::ConfigError>(())
//! ```

mod error;
mod synth_config;
mod value;

/// Platform-specific configuration paths.
pub mod paths;

pub use error::ConfigError;
pub use paths::{default_config_path, ensure_user_config_dir, user_config_dir};
pub use synth_config::{
    AudioConfig, ConfigSource, DEFAULT_REMOTE_PORT, EnvelopeConfig, KeyboardConfig, RemoteConfig,
    SynthConfig,
};
pub use value::parse_quantity;
