//! Real-time playback driven by stdin and the TCP remote.

use std::io::BufRead;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tins_io::{AudioBackend, BackendStreamConfig, CpalBackend};
use tins_synth::{ControlBridge, Synth, UiVoice};

use super::common::{apply_audio_overrides, load_config, parse_gain, parse_nonzero};
use crate::protocol::handle_line;
use crate::remote::RemoteListener;
use crate::status::StatusReporter;
use crate::voice_spec::parse_voice;

/// Interval between status lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Poll period of the control loop while waiting for a stop request.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Width of the `--scope` row in characters.
const SCOPE_WIDTH: usize = 64;

#[derive(Args)]
pub struct PlayArgs {
    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate in Hz (overrides the config)
    #[arg(long, value_parser = parse_nonzero::<u32>)]
    sample_rate: Option<u32>,

    /// Samples per render pass (overrides the config)
    #[arg(long, value_parser = parse_nonzero::<usize>)]
    block_size: Option<usize>,

    /// Output channels; the mono signal is copied to each
    #[arg(long, default_value = "2", value_parser = parse_nonzero::<u16>)]
    channels: u16,

    /// Free voice as shape:freq:amp[:param] (repeatable)
    #[arg(long = "voice", value_name = "SPEC", value_parser = parse_voice)]
    voices: Vec<UiVoice>,

    /// Output gain applied after the engine (e.g. 0.5 or -6dB)
    #[arg(long, default_value = "1.0", value_parser = parse_gain)]
    headroom: f32,

    /// Do not start the TCP remote listener
    #[arg(long)]
    no_remote: bool,

    /// Remote listen address (overrides the config)
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Stream rendered blocks to the remote client
    #[arg(long)]
    stream_signal: bool,

    /// Print an ASCII oscilloscope row with each status line
    #[arg(long)]
    scope: bool,
}

pub fn run(args: PlayArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_audio_overrides(&mut config, args.sample_rate, args.block_size);
    if let Some(listen) = args.listen {
        config.remote.listen = listen;
    }
    config.remote.stream_signal |= args.stream_signal;

    let backend = CpalBackend::new();
    let stream_config = BackendStreamConfig {
        sample_rate: config.audio.sample_rate,
        buffer_size: config.audio.block_size as u32,
        channels: args.channels,
        device_name: args.device.clone(),
    };
    let actual_rate = backend.actual_sample_rate(&stream_config);
    if actual_rate != config.audio.sample_rate {
        tracing::warn!(
            requested = config.audio.sample_rate,
            actual = actual_rate,
            "device does not support the requested sample rate"
        );
        config.audio.sample_rate = actual_rate;
    }
    let stream_config = BackendStreamConfig {
        sample_rate: actual_rate,
        ..stream_config
    };

    let mut synth = Synth::new(config.synth_settings());
    let bridge = synth.bridge().clone();
    let tap = Arc::clone(synth.tap());
    let sample_rate = synth.sample_rate();
    let block_size = synth.block_size();

    if !args.voices.is_empty() {
        bridge.apply_ui_voices(&args.voices)?;
        tracing::info!(count = args.voices.len(), "free voices seeded");
    }

    if config.remote.enabled && !args.no_remote {
        let streamed = config.remote.stream_signal.then(|| Arc::clone(&tap));
        RemoteListener::bind(config.remote.listen, bridge.clone(), streamed)?.spawn()?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    spawn_stdin_reader(bridge.clone(), Arc::clone(&running))?;

    let channels = usize::from(args.channels);
    let headroom = args.headroom;
    let _stream = backend.build_output_stream(
        &stream_config,
        Box::new(move |out: &mut [f32]| {
            synth.fill_interleaved(out, channels);
            if headroom != 1.0 {
                for sample in out.iter_mut() {
                    *sample *= headroom;
                }
            }
        }),
        Box::new(|err| tracing::error!(error = err, "output stream error")),
    )?;

    eprintln!(
        "Playing {} keys ({}). Type `set <key>` / `res <key>`, `quit` or Ctrl+C to stop.",
        bridge.layout().len(),
        key_list(&bridge),
    );

    let mut reporter = StatusReporter::new(sample_rate, block_size);
    let mut next_status = Instant::now() + STATUS_INTERVAL;
    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);
        if Instant::now() >= next_status {
            next_status += STATUS_INTERVAL;
            reporter.report(&tap, bridge.dropped_voices());
            if args.scope {
                println!("{}", reporter.scope_row(&tap, SCOPE_WIDTH));
            }
        }
    }

    tracing::info!(blocks = tap.blocks_rendered(), "playback stopped");
    Ok(())
}

/// Feed stdin lines to the bridge until EOF or `quit`, then stop playback.
fn spawn_stdin_reader(bridge: ControlBridge, running: Arc<AtomicBool>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("tins-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if handle_line(&line, &bridge, "stdin") {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        })?;
    Ok(())
}

fn key_list(bridge: &ControlBridge) -> String {
    bridge
        .layout()
        .pairs()
        .iter()
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
