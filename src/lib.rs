//! Focus Noise - colored noise for focus timers
//!
//! Plays white, pink or brown noise while a work interval runs. Noise comes
//! from a short looping white-noise buffer shaped by a per-color filter
//! chain, so it sounds unbounded without generating audio on the fly.
//!
//! # Architecture
//!
//! - `signal`: white-noise buffer generation
//! - `dsp`: noise types, filter-chain policy, biquad stages
//! - `graph`: the platform audio boundary (contexts, nodes, sink)
//! - `backend`: software renderer and optional output device
//! - `engine`: the [`NoiseEngine`] playback state machine
//! - `lifecycle`: host visibility/gesture/unload events

pub mod backend;
pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod signal;

pub use dsp::NoiseType;
pub use engine::{EngineConfig, NoiseEngine};
pub use error::{NoiseError, Result};
