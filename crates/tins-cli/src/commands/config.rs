//! Configuration inspection command.

use std::path::Path;

use clap::Args;
use tins_config::paths::CONFIG_FILE_NAME;
use tins_config::{ConfigSource, SynthConfig, ensure_user_config_dir};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    save: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    // Saving to a new explicit path starts from the defaults.
    let (config, source) = match config_path {
        Some(path) if args.save && !path.exists() => {
            (SynthConfig::default(), ConfigSource::Defaults)
        }
        _ => SynthConfig::load_or_default(config_path)?,
    };

    if args.save {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => ensure_user_config_dir()?.join(CONFIG_FILE_NAME),
        };
        config.save(&path)?;
        tracing::info!(path = %path.display(), ?source, "config saved");
        println!("Saved {}", path.display());
        return Ok(());
    }

    match source {
        ConfigSource::File(path) => println!("# loaded from {}", path.display()),
        ConfigSource::Defaults => println!("# compiled defaults (no config file)"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
