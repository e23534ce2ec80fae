//! Offline rendering to a WAV file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tins_io::{WavSink, WavSpec};
use tins_synth::{Synth, UiVoice};

use super::common::{
    apply_audio_overrides, load_config, parse_gain, parse_nonzero, parse_seconds,
};
use crate::protocol::parse_key;
use crate::voice_spec::parse_voice;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Length of the render (e.g. 4, 4s, 500ms)
    #[arg(short, long, default_value = "2s", value_parser = parse_seconds)]
    duration: f32,

    /// Free voice as shape:freq:amp[:param] (repeatable)
    #[arg(long = "voice", value_name = "SPEC", value_parser = parse_voice)]
    voices: Vec<UiVoice>,

    /// Press a key at a time, as key@seconds (repeatable)
    #[arg(long = "press", value_name = "KEY@TIME", value_parser = parse_event)]
    presses: Vec<(char, f32)>,

    /// Release a key at a time, as key@seconds (repeatable)
    #[arg(long = "release", value_name = "KEY@TIME", value_parser = parse_event)]
    releases: Vec<(char, f32)>,

    /// Sample rate in Hz (overrides the config)
    #[arg(long, value_parser = parse_nonzero::<u32>)]
    sample_rate: Option<u32>,

    /// Samples per render pass (overrides the config)
    #[arg(long, value_parser = parse_nonzero::<usize>)]
    block_size: Option<usize>,

    /// Output channels; the mono signal is copied to each
    #[arg(long, default_value = "1", value_parser = parse_nonzero::<u16>)]
    channels: u16,

    /// Bit depth: 16, 24 or 32 (float)
    #[arg(long, default_value = "32", value_parser = ["16", "24", "32"])]
    bits: String,

    /// Output gain applied after the engine (e.g. 0.5 or -6dB)
    #[arg(long, default_value = "1.0", value_parser = parse_gain)]
    headroom: f32,
}

/// A key edge scheduled at a block boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KeyEvent {
    at: f32,
    key: char,
    pressed: bool,
}

/// clap value parser for `key@seconds`.
fn parse_event(s: &str) -> Result<(char, f32), String> {
    let (key, at) = s
        .rsplit_once('@')
        .ok_or_else(|| format!("invalid event '{}' (expected key@seconds)", s))?;
    let key = parse_key(key).map_err(|e| e.to_string())?;
    let at = parse_seconds(at)?;
    Ok((key, at))
}

/// Merge presses and releases into one timeline. A press and a release at
/// the same instant are applied press first.
fn timeline(presses: &[(char, f32)], releases: &[(char, f32)]) -> Vec<KeyEvent> {
    let mut events: Vec<KeyEvent> = presses
        .iter()
        .map(|&(key, at)| KeyEvent {
            at,
            key,
            pressed: true,
        })
        .chain(releases.iter().map(|&(key, at)| KeyEvent {
            at,
            key,
            pressed: false,
        }))
        .collect();
    events.sort_by(|a, b| a.at.total_cmp(&b.at).then(b.pressed.cmp(&a.pressed)));
    events
}

pub fn run(args: RenderArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_audio_overrides(&mut config, args.sample_rate, args.block_size);

    let mut synth = Synth::new(config.synth_settings());
    let bridge = synth.bridge().clone();
    let sample_rate = synth.sample_rate();
    let block_size = synth.block_size();

    let events = timeline(&args.presses, &args.releases);
    if let Some(event) = events
        .iter()
        .find(|e| bridge.layout().index_of(e.key).is_none())
    {
        anyhow::bail!(
            "key '{}' is not on the keyboard (keys: {})",
            event.key,
            bridge
                .layout()
                .pairs()
                .iter()
                .map(|(k, _)| k.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
    if !args.voices.is_empty() {
        bridge.apply_ui_voices(&args.voices)?;
    }

    let total_frames = (f64::from(args.duration) * f64::from(sample_rate)).ceil() as u64;
    let spec = WavSpec {
        channels: args.channels,
        sample_rate: config.audio.sample_rate,
        bits_per_sample: args.bits.parse()?,
    };
    let mut sink = WavSink::create(&args.output, spec)
        .with_context(|| format!("cannot create {}", args.output.display()))?;

    println!(
        "Rendering {:.2}s at {} Hz ({} frames per block) to {}",
        args.duration,
        spec.sample_rate,
        block_size,
        args.output.display()
    );

    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut pending = events.iter().peekable();
    let mut scaled = vec![0.0f32; block_size];
    let mut peak = 0.0f32;
    let mut written = 0u64;

    while written < total_frames {
        let now = written as f32 / sample_rate;
        while let Some(event) = pending.next_if(|e| e.at <= now) {
            bridge.set_key(event.key, event.pressed)?;
        }

        let block = synth.render_block();
        let take = block.len().min((total_frames - written) as usize);
        for (dst, &src) in scaled.iter_mut().zip(&block[..take]) {
            *dst = src * args.headroom;
            peak = peak.max(dst.abs());
        }
        sink.write_mono(&scaled[..take])?;

        written += take as u64;
        pb.set_position(written);
    }

    let frames = sink.frames_written();
    sink.finalize()?;
    pb.finish_with_message("done");

    let skipped = pending.count();
    if skipped > 0 {
        tracing::warn!(skipped, "key events after the end of the render were ignored");
    }
    let dropped = synth.dropped_voices();
    if dropped > 0 {
        tracing::warn!(dropped, "UI voices did not fit in their bank");
    }

    println!("\nWrote {} frames, peak {:.3}", frames, peak);
    if peak > 1.0 {
        println!("Output exceeds full scale; lower --headroom to avoid clipping.");
    }
    Ok(())
}
