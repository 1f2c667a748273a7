//! DSP building blocks
//!
//! Noise colors, the per-color filter chain policy, and the biquad stage the
//! software renderer runs.

mod biquad;
mod chain;
mod noise_type;

pub use biquad::{Biquad, BiquadCoeffs, FilterMode};
pub use chain::{
    FilterChain, FilterStage, BROWN_LOWPASS_HZ, BROWN_SECOND_LOWPASS_HZ, BUTTERWORTH_Q,
    PINK_HIGHPASS_HZ,
};
pub use noise_type::NoiseType;
