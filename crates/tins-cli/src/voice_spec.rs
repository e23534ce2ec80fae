//! `--voice shape:freq:amp[:param]` parsing.

use tins_config::parse_quantity;
use tins_synth::{UiVoice, WaveShape};

/// clap value parser for a free voice.
///
/// `amp` takes a linear gain or a dB value (`-12dB`). `param` defaults to
/// the UI default shape parameter.
pub fn parse_voice(spec: &str) -> Result<UiVoice, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (shape, freq, amp, param) = match parts.as_slice() {
        [shape, freq, amp] => (shape, freq, amp, None),
        [shape, freq, amp, param] => (shape, freq, amp, Some(param)),
        _ => {
            return Err(format!(
                "invalid voice '{}' (expected shape:freq:amp[:param])",
                spec
            ));
        }
    };

    let shape: WaveShape = shape.parse().map_err(|e| format!("{}", e))?;
    let frequency: f32 = freq
        .trim()
        .parse()
        .map_err(|_| format!("invalid frequency '{}'", freq))?;
    let amplitude = parse_quantity(amp)
        .filter(|a| a.is_finite())
        .ok_or_else(|| format!("invalid amplitude '{}'", amp))?;

    let voice = UiVoice::new(shape, frequency, amplitude);
    match param {
        Some(param) => {
            let value = parse_quantity(param)
                .filter(|p| (0.0..=1.0).contains(p))
                .ok_or_else(|| {
                    format!("invalid shape parameter '{}' (expected 0..1)", param)
                })?;
            Ok(voice.with_shape_param(value))
        }
        None => Ok(voice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_part_voice() {
        let voice = parse_voice("saw:220:0.25").unwrap();
        assert_eq!(voice.shape, Some(WaveShape::Sawtooth));
        assert_eq!(voice.frequency, 220.0);
        assert_eq!(voice.amplitude, 0.25);
        assert_eq!(voice.shape_param, 0.5);
    }

    #[test]
    fn decibel_amplitude_and_param() {
        let voice = parse_voice("square:-110:-6dB:25%").unwrap();
        assert_eq!(voice.frequency, -110.0);
        assert!((voice.amplitude - 0.501).abs() < 0.001);
        assert_eq!(voice.shape_param, 0.25);
    }

    #[test]
    fn rejects_bad_voices() {
        assert!(parse_voice("sine:440").is_err());
        assert!(parse_voice("kazoo:440:1").is_err());
        assert!(parse_voice("sine:fast:1").is_err());
        assert!(parse_voice("sine:440:loud").is_err());
        assert!(parse_voice("sine:440:1:x").is_err());
        assert!(parse_voice("square:440:1:150%").is_err());
        assert!(parse_voice("square:440:1:-0.1").is_err());
        assert!(parse_voice("square:440:1:100%").is_ok());
    }
}
