//! Noise Engine Module
//!
//! Playback state, session construction, lifecycle handling and WAV export:
//! - Engine configuration
//! - Playback sessions (player → filters → gain → sink)
//! - The engine state machine

pub mod config;
pub mod io;
mod noise_engine;
mod session;

pub use config::EngineConfig;
pub use io::{export_wav, ExportFormat};
pub use noise_engine::NoiseEngine;
pub use session::PlaybackSession;
