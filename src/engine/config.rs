//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::NoiseType;
use crate::error::{NoiseError, Result};
use crate::signal::{DEFAULT_BUFFER_SECS, MAX_BUFFER_SECS, MIN_BUFFER_SECS};

/// Longest accepted volume ramp
pub const MAX_VOLUME_RAMP_MS: u32 = 1000;

/// Tunables for a [`NoiseEngine`](super::NoiseEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the looping noise buffer in seconds
    pub buffer_seconds: f64,
    /// Gain ramp for volume changes while playing. 0 steps immediately.
    pub volume_ramp_ms: u32,
    /// Noise type the host starts with
    pub default_noise_type: NoiseType,
    /// Volume the host starts with
    pub default_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: DEFAULT_BUFFER_SECS,
            volume_ramp_ms: 0,
            default_noise_type: NoiseType::Pink,
            default_volume: 0.5,
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BUFFER_SECS..=MAX_BUFFER_SECS).contains(&self.buffer_seconds) {
            return Err(NoiseError::InvalidConfig {
                reason: format!(
                    "buffer_seconds must be in [{MIN_BUFFER_SECS}, {MAX_BUFFER_SECS}], got {}",
                    self.buffer_seconds
                ),
            });
        }
        if self.volume_ramp_ms > MAX_VOLUME_RAMP_MS {
            return Err(NoiseError::InvalidConfig {
                reason: format!(
                    "volume_ramp_ms must be at most {MAX_VOLUME_RAMP_MS}, got {}",
                    self.volume_ramp_ms
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(NoiseError::InvalidConfig {
                reason: format!("default_volume must be in [0, 1], got {}", self.default_volume),
            });
        }
        Ok(())
    }

    /// Volume ramp in seconds, `None` for a step change
    pub fn volume_ramp_secs(&self) -> Option<f32> {
        (self.volume_ramp_ms > 0).then(|| self.volume_ramp_ms as f32 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume_ramp_secs(), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "volume_ramp_ms": 30, "default_noise_type": "brown" }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.volume_ramp_ms, 30);
        assert_eq!(config.default_noise_type, NoiseType::Brown);
        assert_eq!(config.buffer_seconds, DEFAULT_BUFFER_SECS);
        assert_eq!(config.volume_ramp_secs(), Some(0.03));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let config = EngineConfig {
            buffer_seconds: 0.25,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_rejects_oversized_buffer_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "buffer_seconds": 1e300 }}"#).unwrap();

        let err = EngineConfig::from_json_file(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let longest = EngineConfig {
            buffer_seconds: MAX_BUFFER_SECS,
            ..Default::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_volume() {
        let config = EngineConfig {
            default_volume: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
