//! Integration tests for tins-config.
//!
//! These tests exercise file loading, saving and the load precedence.

use std::fs;

use tempfile::TempDir;
use tins_config::{ConfigError, ConfigSource, SynthConfig};
use tins_synth::{Synth, WaveShape};

/// Save then load preserves every section.
#[test]
fn test_config_save_load_roundtrip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut original = SynthConfig::default();
    original.audio.sample_rate = 48000;
    original.envelope.sustain_time = f32::INFINITY;
    original.keyboard.shape = WaveShape::Sawtooth;
    original.remote.stream_signal = true;

    original.save(&path).expect("should save config");
    assert!(path.is_file(), "parent directories are created");

    let loaded = SynthConfig::load(&path).expect("should load config");
    assert_eq!(loaded, original);
}

/// A partially valid file still applies its good keys.
#[test]
fn test_partial_file_applies_valid_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "[envelope]\nattack_time = 0.01\nrelease_time = \"never\"\n[keyboard]\nshape = \"square\"\n",
    )
    .unwrap();

    let config = SynthConfig::load(&path).unwrap();
    assert_eq!(config.envelope.attack_time, 0.01);
    assert_eq!(config.envelope.release_time, 0.3);
    assert_eq!(config.keyboard.shape, WaveShape::Square);
}

/// An explicit path wins and must exist.
#[test]
fn test_explicit_path_precedence() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, "[audio]\nblock_size = 64\n").unwrap();

    let (config, source) = SynthConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.audio.block_size, 64);
    assert_eq!(source, ConfigSource::File(path.clone()));

    let missing = temp_dir.path().join("missing.toml");
    let err = SynthConfig::load_or_default(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

/// Malformed TOML in a file surfaces as a parse error.
#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[envelope\nattack_time = 1").unwrap();
    assert!(matches!(
        SynthConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

/// A loaded config drives the engine.
#[test]
fn test_config_builds_engine() {
    let config = SynthConfig::from_toml(
        "[audio]\nblock_size = 128\n[keyboard]\nshape = \"triangle\"\nbase_semitone = 12\n",
    )
    .unwrap();
    let mut synth = Synth::new(config.synth_settings());
    assert_eq!(synth.block_size(), 128);
    assert_eq!(synth.key_shape(), WaveShape::Triangle);

    let h = synth.bridge().layout().index_of('h').unwrap();
    synth.bridge().set_key_state(h, true).unwrap();
    synth.render_block();
    let voice = synth.keyed_voice(h).unwrap();
    assert!((voice.oscillator.frequency - 880.0).abs() < 0.01);
    assert!(synth.signal().iter().any(|&s| s != 0.0));
}
