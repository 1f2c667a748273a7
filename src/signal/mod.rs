//! Signal Source
//!
//! Generates the white-noise buffers every noise type is shaped from.
//! Output is only statistically defined: the RNG is never seeded.

mod buffer;

pub use buffer::{
    linear_to_db, NoiseBuffer, DEFAULT_BUFFER_SECS, MAX_BUFFER_SECS, MIN_BUFFER_SECS,
};

use rand::Rng;

use crate::error::{NoiseError, Result};

/// Upper bound on generated samples: a minute at 384 kHz
pub const MAX_BUFFER_SAMPLES: usize = 384_000 * 60;

/// Fill a buffer of `sample_rate × duration_secs` uniform samples in [-1, 1]
///
/// # Example
/// ```
/// use focus_noise::signal::generate_white_noise;
/// let buffer = generate_white_noise(48000, 2.0).unwrap();
/// assert_eq!(buffer.len(), 96000);
/// assert!(buffer.peak() <= 1.0);
/// ```
pub fn generate_white_noise(sample_rate: u32, duration_secs: f64) -> Result<NoiseBuffer> {
    generate_white_noise_with(&mut rand::thread_rng(), sample_rate, duration_secs)
}

/// Same as [`generate_white_noise`] with a caller-supplied RNG
pub fn generate_white_noise_with<R: Rng + ?Sized>(
    rng: &mut R,
    sample_rate: u32,
    duration_secs: f64,
) -> Result<NoiseBuffer> {
    if sample_rate == 0 {
        return Err(NoiseError::InvalidBuffer {
            reason: "sample rate must be positive".to_string(),
        });
    }
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(NoiseError::InvalidBuffer {
            reason: format!("duration must be positive, got {duration_secs}"),
        });
    }

    let len = (sample_rate as f64 * duration_secs).round();
    if len > MAX_BUFFER_SAMPLES as f64 {
        return Err(NoiseError::InvalidBuffer {
            reason: format!(
                "{duration_secs} s at {sample_rate} Hz exceeds {MAX_BUFFER_SAMPLES} samples"
            ),
        });
    }
    let len = len as usize;
    let samples: Vec<f32> = (0..len).map(|_| rng.gen_range(-1.0_f32..=1.0)).collect();

    Ok(NoiseBuffer::from_samples(samples, sample_rate))
}
