//! CLI Module
//!
//! Command-line interface for the focus noise engine.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::dsp::NoiseType;

/// Focus Noise - colored background noise for focus sessions
#[derive(Parser, Debug)]
#[command(name = "focus-noise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render noise through the engine into a WAV file
    #[command(name = "render")]
    Render {
        /// Noise type: white, pink or brown
        #[arg(short, long)]
        noise: Option<NoiseType>,

        /// Volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,

        /// Length of the rendered file in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,

        /// Bit depth: 16, 24 or 32
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// Print the filter chain for a noise type
    #[command(name = "chain")]
    Chain {
        /// Noise type: white, pink or brown
        #[arg(short, long)]
        noise: NoiseType,
    },

    /// Play noise on the default output device for one focus interval
    #[cfg(feature = "device")]
    #[command(name = "play")]
    Play {
        /// Noise type: white, pink or brown
        #[arg(short, long)]
        noise: Option<NoiseType>,

        /// Volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,

        /// Interval length in minutes
        #[arg(short, long, default_value_t = 25.0)]
        minutes: f64,

        /// Output device name (default device if omitted)
        #[arg(short, long)]
        device: Option<String>,
    },

    /// List output devices
    #[cfg(feature = "device")]
    #[command(name = "devices")]
    Devices,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_takes_noise_flag() {
        let cli = Cli::try_parse_from(["focus-noise", "chain", "--noise", "brown"]).unwrap();
        match cli.command {
            Some(Commands::Chain { noise }) => assert_eq!(noise, NoiseType::Brown),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["focus-noise", "chain", "-n", "white"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Chain { noise: NoiseType::White })));
    }

    #[test]
    fn test_chain_rejects_positional_noise() {
        assert!(Cli::try_parse_from(["focus-noise", "chain", "pink"]).is_err());
    }
}
