//! Tins CLI - play, render and inspect the tins synthesizer.

mod commands;
mod protocol;
mod remote;
mod status;
mod voice_spec;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tins")]
#[command(author, version, about = "Tins polyphonic synthesizer", long_about = None)]
struct Cli {
    /// Configuration file (default: the user config file, if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play in real time, driven by stdin and the TCP remote
    Play(commands::play::PlayArgs),

    /// Render offline to a WAV file
    Render(commands::render::RenderArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Show the envelope and a preview of its curve
    Envelope(commands::envelope::EnvelopeArgs),

    /// Show or save the effective configuration
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Play(args) => commands::play::run(args, config_path),
        Commands::Render(args) => commands::render::run(args, config_path),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Envelope(args) => commands::envelope::run(args, config_path),
        Commands::Config(args) => commands::config::run(args, config_path),
    }
}
