//! Focus Noise CLI
//!
//! Command-line front end for the noise engine.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use focus_noise::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Focus Noise v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref()).context("loading engine config")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, config),
        None => {
            println!("Focus Noise v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: focus_noise::EngineConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            noise,
            volume,
            seconds,
            output,
            sample_rate,
            bit_depth,
        } => commands::render(config, noise, volume, seconds, &output, sample_rate, bit_depth)
            .with_context(|| format!("rendering to {}", output.display())),
        Commands::Chain { noise } => Ok(commands::show_chain(noise)?),
        #[cfg(feature = "device")]
        Commands::Play {
            noise,
            volume,
            minutes,
            device,
        } => Ok(commands::play(config, noise, volume, minutes, device.as_deref())?),
        #[cfg(feature = "device")]
        Commands::Devices => Ok(commands::list_devices()?),
    }
}
