//! The `tins` configuration file.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tins_synth::{EnvelopeParams, KeyLayout, KeyVoiceSettings, SynthSettings, WaveShape};
use toml::Table;

use crate::error::ConfigError;
use crate::paths;
use crate::value::Section;

/// Default TCP port of the remote listener.
pub const DEFAULT_REMOTE_PORT: u16 = 5000;

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn unit_range(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

/// Output stream settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per render pass.
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 1024,
        }
    }
}

/// Default envelope of keyed voices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopeConfig {
    /// Seconds from silence to peak.
    pub attack_time: f32,
    /// Seconds from peak to the sustain level.
    pub decay_time: f32,
    /// Sustain level, 0..1.
    pub sustain_level: f32,
    /// Longest time in sustain before the note releases on its own.
    /// `inf` disables the timeout.
    pub sustain_time: f32,
    /// Seconds from the release-start level to silence.
    pub release_time: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeParams::default().into()
    }
}

impl From<EnvelopeParams> for EnvelopeConfig {
    fn from(p: EnvelopeParams) -> Self {
        Self {
            attack_time: p.attack_time,
            decay_time: p.decay_time,
            sustain_level: p.sustain_level,
            sustain_time: p.sustain_time,
            release_time: p.release_time,
        }
    }
}

impl EnvelopeConfig {
    /// Engine envelope parameters.
    pub fn params(&self) -> EnvelopeParams {
        EnvelopeParams {
            attack_time: self.attack_time,
            decay_time: self.decay_time,
            sustain_level: self.sustain_level,
            sustain_time: self.sustain_time,
            release_time: self.release_time,
        }
    }
}

/// Keyed-voice settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyboardConfig {
    /// Wave shape of every keyed voice.
    #[serde(serialize_with = "serialize_shape")]
    pub shape: WaveShape,
    /// Linear gain of a pressed key.
    pub amplitude: f32,
    /// Shape parameter of a pressed key.
    pub shape_parameter: f32,
    /// Semitone shift of the whole layout; 0 puts `h` on A4.
    pub base_semitone: i32,
    /// Hold a note in sustain for as long as its key is down.
    pub hold_refreshes_sustain: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        let key_voice = KeyVoiceSettings::default();
        Self {
            shape: WaveShape::Sine,
            amplitude: key_voice.amplitude,
            shape_parameter: key_voice.shape_param,
            base_semitone: 0,
            hold_refreshes_sustain: false,
        }
    }
}

fn serialize_shape<S: Serializer>(shape: &WaveShape, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(shape.name())
}

/// TCP remote-control listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoteConfig {
    /// Start the listener with `play`.
    pub enabled: bool,
    /// Address to bind.
    pub listen: SocketAddr,
    /// Send each rendered block back to the client.
    pub stream_signal: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_REMOTE_PORT)),
            stream_signal: false,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// No file; compiled defaults.
    Defaults,
}

/// Complete `tins` configuration.
///
/// # TOML Format
///
/// ```toml
/// [audio]
/// sample_rate = 44100
/// block_size = 1024
///
/// [envelope]
/// attack_time = 0.1        # or "100ms"
/// decay_time = 0.2
/// sustain_level = 0.7
/// sustain_time = 30.0
/// release_time = 0.3
///
/// [keyboard]
/// shape = "sine"
/// amplitude = 0.5          # or "-6dB"
/// shape_parameter = 1.0
/// base_semitone = 0
/// hold_refreshes_sustain = false
///
/// [remote]
/// enabled = true
/// listen = "0.0.0.0:5000"
/// stream_signal = false
/// ```
///
/// Every key is optional. A value that is malformed or out of range is
/// logged and replaced by its default; the rest of the file still applies.
///
/// # Example
///
/// ```rust
/// use tins_config::SynthConfig;
///
/// let config = SynthConfig::from_toml("[envelope]\nattack_time = \"20ms\"")?;
/// assert!((config.envelope.attack_time - 0.02).abs() < 1e-6);
/// assert_eq!(config.audio.sample_rate, 44100);
/// # Ok::<(), tins_config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SynthConfig {
    /// `[audio]`
    pub audio: AudioConfig,
    /// `[envelope]`
    pub envelope: EnvelopeConfig,
    /// `[keyboard]`
    pub keyboard: KeyboardConfig,
    /// `[remote]`
    pub remote: RemoteConfig,
}

impl SynthConfig {
    /// Parse a TOML document.
    ///
    /// Only TOML syntax errors fail; bad values fall back per key.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let root: Table = toml::from_str(toml_str)?;
        Ok(Self::from_table(&root))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load with the usual precedence.
    ///
    /// An explicit path must exist. Without one, the user config file is read
    /// if present, otherwise the compiled defaults are returned.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, ConfigSource::File(path.to_path_buf())));
        }
        let path = paths::default_config_path();
        if path.is_file() {
            Ok((Self::load(&path)?, ConfigSource::File(path)))
        } else {
            Ok((Self::default(), ConfigSource::Defaults))
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Engine settings derived from this configuration.
    pub fn synth_settings(&self) -> SynthSettings {
        SynthSettings {
            sample_rate: self.audio.sample_rate as f32,
            block_size: self.audio.block_size,
            envelope: self.envelope.params(),
            layout: KeyLayout::default().with_base_semitone(self.keyboard.base_semitone),
            key_shape: self.keyboard.shape,
            key_voice: KeyVoiceSettings {
                amplitude: self.keyboard.amplitude,
                shape_param: self.keyboard.shape_parameter,
            },
            hold_refreshes_sustain: self.keyboard.hold_refreshes_sustain,
            ..SynthSettings::default()
        }
    }

    fn from_table(root: &Table) -> Self {
        for key in root.keys() {
            if !["audio", "envelope", "keyboard", "remote"].contains(&key.as_str()) {
                tracing::warn!(section = %key, "unknown config section ignored");
            }
        }

        let d = Self::default();

        let s = Section::new(root, "audio");
        s.warn_unknown(&["sample_rate", "block_size"]);
        let audio = AudioConfig {
            sample_rate: s.int("sample_rate", d.audio.sample_rate, |v| v > 0),
            block_size: s.int("block_size", d.audio.block_size, |v| v > 0),
        };

        let s = Section::new(root, "envelope");
        s.warn_unknown(&[
            "attack_time",
            "decay_time",
            "sustain_level",
            "sustain_time",
            "release_time",
        ]);
        let envelope = EnvelopeConfig {
            attack_time: s.f32("attack_time", d.envelope.attack_time, non_negative),
            decay_time: s.f32("decay_time", d.envelope.decay_time, non_negative),
            sustain_level: s.f32("sustain_level", d.envelope.sustain_level, unit_range),
            sustain_time: s.f32("sustain_time", d.envelope.sustain_time, |v| v >= 0.0),
            release_time: s.f32("release_time", d.envelope.release_time, non_negative),
        };

        let s = Section::new(root, "keyboard");
        s.warn_unknown(&[
            "shape",
            "amplitude",
            "shape_parameter",
            "base_semitone",
            "hold_refreshes_sustain",
        ]);
        let keyboard = KeyboardConfig {
            shape: s.parsed("shape", d.keyboard.shape),
            amplitude: s.f32("amplitude", d.keyboard.amplitude, non_negative),
            shape_parameter: s.f32("shape_parameter", d.keyboard.shape_parameter, unit_range),
            base_semitone: s.int("base_semitone", d.keyboard.base_semitone, |v| {
                (-96..=96).contains(&v)
            }),
            hold_refreshes_sustain: s.bool(
                "hold_refreshes_sustain",
                d.keyboard.hold_refreshes_sustain,
            ),
        };

        let s = Section::new(root, "remote");
        s.warn_unknown(&["enabled", "listen", "stream_signal"]);
        let remote = RemoteConfig {
            enabled: s.bool("enabled", d.remote.enabled),
            listen: s.parsed("listen", d.remote.listen),
            stream_signal: s.bool("stream_signal", d.remote.stream_signal),
        };

        Self {
            audio,
            envelope,
            keyboard,
            remote,
        }
    }
}
