//! WAV export of rendered noise
//!
//! Writes mono sample blocks produced by the software renderer.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{NoiseError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Sample rate written to the header
    pub sample_rate: u32,
    /// Bit depth: 16, 24, or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat {
            sample_rate: 48000,
            bit_depth: 16,
        }
    }
}

impl ExportFormat {
    pub fn new(sample_rate: u32, bit_depth: u16) -> Self {
        ExportFormat {
            sample_rate,
            bit_depth,
        }
    }
}

/// Write mono `samples` to a WAV file
pub fn export_wav(samples: &[f32], path: &Path, format: ExportFormat) -> Result<()> {
    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(NoiseError::UnsupportedFormat {
                format: format!("{other}-bit audio (only 16, 24, 32 supported)"),
            })
        }
    };
    let spec = WavSpec {
        channels: 1,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    match format.bit_depth {
        16 => {
            for &sample in samples {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        24 => {
            for &sample in samples {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        _ => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}
