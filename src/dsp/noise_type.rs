//! Noise colors offered by the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NoiseError;

/// Spectral color of the noise bed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    /// Flat spectrum
    White,
    /// Roughly 1/f
    #[default]
    Pink,
    /// Roughly 1/f²
    Brown,
}

impl NoiseType {
    /// All noise types, in menu order
    pub const ALL: [NoiseType; 3] = [NoiseType::White, NoiseType::Pink, NoiseType::Brown];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseType::White => "white",
            NoiseType::Pink => "pink",
            NoiseType::Brown => "brown",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseType {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(NoiseType::White),
            "pink" => Ok(NoiseType::Pink),
            "brown" | "brownian" | "red" => Ok(NoiseType::Brown),
            other => Err(NoiseError::InvalidConfig {
                reason: format!("unknown noise type '{other}' (expected white, pink or brown)"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for noise_type in NoiseType::ALL {
            assert_eq!(noise_type.to_string().parse::<NoiseType>().unwrap(), noise_type);
        }
        assert_eq!(" Brown ".parse::<NoiseType>().unwrap(), NoiseType::Brown);
        assert!("violet".parse::<NoiseType>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&NoiseType::Pink).unwrap();
        assert_eq!(json, "\"pink\"");
        let back: NoiseType = serde_json::from_str("\"white\"").unwrap();
        assert_eq!(back, NoiseType::White);
    }
}
