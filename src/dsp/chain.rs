//! Filter Chain policy
//!
//! Stages are applied in chain order (index 0 first). A chain is a plain
//! description; the live nodes built from it belong to a playback session
//! and are rebuilt, never edited, when the noise type changes.
//!
//! | Type  | Stages                                   |
//! |-------|------------------------------------------|
//! | white | none                                     |
//! | pink  | high-pass 100 Hz                         |
//! | brown | low-pass 500 Hz, then low-pass 200 Hz    |

use serde::{Deserialize, Serialize};

use super::{Biquad, FilterMode, NoiseType};

/// Butterworth Q used by every stage
pub const BUTTERWORTH_Q: f32 = 0.707;

/// Pink: high-pass corner that strips sub-audio rumble
pub const PINK_HIGHPASS_HZ: f32 = 100.0;

/// Brown: first low-pass corner
pub const BROWN_LOWPASS_HZ: f32 = 500.0;

/// Brown: second low-pass corner
pub const BROWN_SECOND_LOWPASS_HZ: f32 = 200.0;

/// One spectral-shaping stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterStage {
    pub mode: FilterMode,
    /// Corner frequency in Hz
    pub frequency_hz: f32,
    /// Resonance
    pub q: f32,
}

impl FilterStage {
    pub fn low_pass(frequency_hz: f32, q: f32) -> Self {
        Self {
            mode: FilterMode::LowPass,
            frequency_hz,
            q,
        }
    }

    pub fn high_pass(frequency_hz: f32, q: f32) -> Self {
        Self {
            mode: FilterMode::HighPass,
            frequency_hz,
            q,
        }
    }

    /// Running filter for this stage at `sample_rate`
    pub fn to_biquad(&self, sample_rate: u32) -> Biquad {
        Biquad::new(
            self.mode,
            sample_rate as f64,
            self.frequency_hz as f64,
            self.q as f64,
        )
    }
}

/// Ordered stages for one noise type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    noise_type: NoiseType,
    stages: Vec<FilterStage>,
}

impl FilterChain {
    /// Build the chain for a noise type
    ///
    /// # Example
    /// ```
    /// use focus_noise::dsp::{FilterChain, NoiseType};
    /// assert!(FilterChain::for_noise_type(NoiseType::White).is_empty());
    /// assert_eq!(FilterChain::for_noise_type(NoiseType::Brown).len(), 2);
    /// ```
    pub fn for_noise_type(noise_type: NoiseType) -> Self {
        let stages = match noise_type {
            NoiseType::White => Vec::new(),
            NoiseType::Pink => vec![FilterStage::high_pass(PINK_HIGHPASS_HZ, BUTTERWORTH_Q)],
            NoiseType::Brown => vec![
                FilterStage::low_pass(BROWN_LOWPASS_HZ, BUTTERWORTH_Q),
                FilterStage::low_pass(BROWN_SECOND_LOWPASS_HZ, BUTTERWORTH_Q),
            ],
        };
        Self { noise_type, stages }
    }

    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterStage> {
        self.stages.iter()
    }

    /// Combined magnitude response of all stages at `frequency`
    pub fn magnitude_at(&self, frequency: f64, sample_rate: u32) -> f64 {
        self.stages
            .iter()
            .map(|stage| {
                stage
                    .to_biquad(sample_rate)
                    .coeffs()
                    .magnitude_at(frequency, sample_rate as f64)
            })
            .product()
    }

    /// Serialize the chain for display
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
