//! Biquad low/high-pass stage
//!
//! Second-order sections from the Audio EQ Cookbook, the same response a
//! browser `BiquadFilterNode` gives for `lowpass` and `highpass`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Response shape of a filter stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Remove above frequency
    LowPass,
    /// Remove below frequency
    HighPass,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::LowPass => write!(f, "lowpass"),
            FilterMode::HighPass => write!(f, "highpass"),
        }
    }
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Calculate coefficients for a pass filter
    pub fn calculate(mode: FilterMode, sample_rate: f64, frequency: f64, q: f64) -> Self {
        // Keep the corner strictly below Nyquist
        let nyquist = (sample_rate / 2.0 - 1.0).max(1.0);
        let freq = frequency.clamp(1.0, nyquist);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match mode {
            FilterMode::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            FilterMode::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `frequency` (linear)
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// One running biquad: coefficients plus delay line
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new(mode: FilterMode, sample_rate: f64, frequency: f64, q: f64) -> Self {
        Self {
            coeffs: BiquadCoeffs::calculate(mode, sample_rate, frequency, q),
            ..Default::default()
        }
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Process a single sample (Direct Form I)
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input = input as f64;
        let c = &self.coeffs;
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output as f32
    }

    /// Process a block in place
    pub fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SR: f64 = 48000.0;

    #[test]
    fn test_butterworth_corner_is_minus_3db() {
        let lp = BiquadCoeffs::calculate(FilterMode::LowPass, SR, 500.0, 0.707);
        assert_abs_diff_eq!(lp.magnitude_at(500.0, SR), 0.707, epsilon = 0.01);

        let hp = BiquadCoeffs::calculate(FilterMode::HighPass, SR, 100.0, 0.707);
        assert_abs_diff_eq!(hp.magnitude_at(100.0, SR), 0.707, epsilon = 0.01);
    }

    #[test]
    fn test_passband_and_stopband() {
        let lp = BiquadCoeffs::calculate(FilterMode::LowPass, SR, 200.0, 0.707);
        assert_abs_diff_eq!(lp.magnitude_at(20.0, SR), 1.0, epsilon = 0.01);
        assert!(lp.magnitude_at(4000.0, SR) < 0.01);

        let hp = BiquadCoeffs::calculate(FilterMode::HighPass, SR, 100.0, 0.707);
        assert_abs_diff_eq!(hp.magnitude_at(5000.0, SR), 1.0, epsilon = 0.01);
        assert!(hp.magnitude_at(10.0, SR) < 0.02);
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = Biquad::new(FilterMode::LowPass, SR, 500.0, 0.707);
        let mut block = vec![1.0_f32; 4800];
        filter.process_block(&mut block);
        assert_abs_diff_eq!(block[4799], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_tiny_sample_rate_keeps_finite_coefficients() {
        for sr in [1.0, 3.0] {
            let coeffs = BiquadCoeffs::calculate(FilterMode::HighPass, sr, 100.0, 0.707);
            assert!(coeffs.magnitude_at(0.5, sr).is_finite());
        }
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new(FilterMode::HighPass, SR, 100.0, 0.707);
        let mut block = vec![1.0_f32; 48000];
        filter.process_block(&mut block);
        assert!(block[47999].abs() < 1e-3);

        filter.reset();
        assert_eq!(filter.process(0.0), 0.0);
    }
}
