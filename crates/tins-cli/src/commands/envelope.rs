//! Envelope inspection command.

use std::path::Path;

use clap::Args;
use tins_synth::EnvelopeParams;

use super::common::{load_config, parse_nonzero, parse_seconds};

/// Preview span used when sustain never times out.
const UNBOUNDED_SUSTAIN_PREVIEW: f32 = 1.0;

#[derive(Args)]
pub struct EnvelopeArgs {
    /// Preview width in columns
    #[arg(long, default_value = "60", value_parser = parse_nonzero::<usize>)]
    width: usize,

    /// Preview height in rows
    #[arg(long, default_value = "10", value_parser = parse_nonzero::<usize>)]
    height: usize,

    /// Time shown for the sustain plateau (default: the configured sustain time)
    #[arg(long, value_parser = parse_seconds)]
    sustain_preview: Option<f32>,
}

pub fn run(args: EnvelopeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let params = config.envelope.params();

    println!("Envelope");
    println!("========\n");
    println!("  Attack:        {:.3} s", params.attack_time);
    println!("  Decay:         {:.3} s", params.decay_time);
    println!("  Sustain level: {:.3}", params.sustain_level);
    if params.sustain_time.is_finite() {
        println!("  Sustain time:  {:.3} s", params.sustain_time);
    } else {
        println!("  Sustain time:  until released");
    }
    println!("  Release:       {:.3} s", params.release_time);
    if params.max_duration().is_finite() {
        println!("  Longest note:  {:.3} s", params.max_duration());
    }
    println!();

    let shown = preview_params(params, args.sustain_preview);
    let mut curve = vec![0.0; args.width];
    shown.fill_preview(&mut curve, shown.max_duration());
    for row in plot(&curve, args.height) {
        println!("  |{}", row);
    }
    println!("  +{}", "-".repeat(args.width));
    println!("   0 s{:>width$.2} s", shown.max_duration(), width = args.width.saturating_sub(4));

    Ok(())
}

/// Parameters with the sustain span replaced for display.
fn preview_params(params: EnvelopeParams, sustain: Option<f32>) -> EnvelopeParams {
    let sustain_time = match sustain {
        Some(t) => t,
        None if params.sustain_time.is_finite() => params.sustain_time,
        None => UNBOUNDED_SUSTAIN_PREVIEW,
    };
    EnvelopeParams {
        sustain_time,
        ..params
    }
}

/// Rows of a filled area plot, top row first.
fn plot(curve: &[f32], height: usize) -> Vec<String> {
    (0..height)
        .rev()
        .map(|row| {
            let threshold = (row as f32 + 0.5) / height as f32;
            curve
                .iter()
                .map(|&v| if v >= threshold { '#' } else { ' ' })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_sustain_is_previewed_with_a_finite_span() {
        let params = EnvelopeParams {
            sustain_time: f32::INFINITY,
            ..Default::default()
        };
        let shown = preview_params(params, None);
        assert_eq!(shown.sustain_time, UNBOUNDED_SUSTAIN_PREVIEW);
        assert!(shown.max_duration().is_finite());
        assert_eq!(preview_params(params, Some(0.2)).sustain_time, 0.2);
    }

    #[test]
    fn plot_fills_below_the_curve() {
        let rows = plot(&[0.0, 0.5, 1.0], 2);
        assert_eq!(rows, vec!["  #".to_string(), " ##".to_string()]);
    }
}
