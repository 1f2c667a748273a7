//! Noise Buffer
//!
//! An immutable block of mono samples that the buffer player loops over.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Shortest buffer that loops without an obvious repeat
pub const MIN_BUFFER_SECS: f64 = 1.0;

/// Longest buffer a session may allocate
pub const MAX_BUFFER_SECS: f64 = 60.0;

/// Default buffer length for a playback session
pub const DEFAULT_BUFFER_SECS: f64 = 2.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Noise Buffer
// ============================================================================

/// Fixed-length mono sample buffer
///
/// Samples are only readable once the buffer is built; players share it
/// through an `Arc`.
#[derive(Clone, PartialEq)]
pub struct NoiseBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl NoiseBuffer {
    /// Wrap already generated samples
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Sample values
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Mean sample value (DC offset). 0.0 for empty buffers.
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| s as f64).sum();
        (sum / self.samples.len() as f64) as f32
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Linear RMS level. 0.0 for empty buffers.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_squares / self.samples.len() as f64).sqrt() as f32
    }

    /// RMS level in dBFS
    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.rms())
    }
}

impl fmt::Debug for NoiseBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseBuffer")
            .field("len", &self.samples.len())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
