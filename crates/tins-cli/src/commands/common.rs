//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use tins_config::{ConfigSource, SynthConfig, parse_quantity};

/// Load the configuration with the usual precedence and log where it came from.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SynthConfig> {
    let (config, source) = SynthConfig::load_or_default(path)?;
    match &source {
        ConfigSource::File(path) => tracing::info!(path = %path.display(), "config loaded"),
        ConfigSource::Defaults => tracing::debug!("no config file, using defaults"),
    }
    Ok(config)
}

/// Override the `[audio]` section from command-line flags.
pub fn apply_audio_overrides(
    config: &mut SynthConfig,
    sample_rate: Option<u32>,
    block_size: Option<usize>,
) {
    if let Some(rate) = sample_rate {
        config.audio.sample_rate = rate;
    }
    if let Some(size) = block_size {
        config.audio.block_size = size;
    }
}

/// clap value parser for a time such as `2.5`, `2.5s` or `750ms`.
pub fn parse_seconds(s: &str) -> Result<f32, String> {
    parse_quantity(s)
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| format!("invalid time '{}' (expected e.g. 2.5, 2.5s or 750ms)", s))
}

/// clap value parser for an output gain such as `0.5` or `-6dB`.
pub fn parse_gain(s: &str) -> Result<f32, String> {
    parse_quantity(s)
        .filter(|g| g.is_finite() && *g >= 0.0)
        .ok_or_else(|| format!("invalid gain '{}' (expected e.g. 0.5 or -6dB)", s))
}

/// clap value parser for a non-zero count.
pub fn parse_nonzero<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match s.parse::<T>() {
        Ok(v) if v != T::default() => Ok(v),
        _ => Err(format!("'{}' is not a positive integer", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_accept_units() {
        assert_eq!(parse_seconds("2"), Ok(2.0));
        assert_eq!(parse_seconds("750ms"), Ok(0.75));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn gain_accepts_decibels() {
        assert_eq!(parse_gain("0dB"), Ok(1.0));
        assert!((parse_gain("-6dB").unwrap() - 0.501).abs() < 0.001);
        assert!(parse_gain("-0.5").is_err());
    }

    #[test]
    fn nonzero_counts() {
        assert_eq!(parse_nonzero::<u32>("48000"), Ok(48000));
        assert!(parse_nonzero::<usize>("0").is_err());
        assert!(parse_nonzero::<usize>("-4").is_err());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = SynthConfig::default();
        apply_audio_overrides(&mut config, None, Some(256));
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.block_size, 256);
    }
}
