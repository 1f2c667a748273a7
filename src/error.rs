//! Error handling for the noise engine
//!
//! Engine operations either succeed or fail outright; nothing here is retried.

use thiserror::Error;

/// Result type alias for noise engine operations
pub type Result<T> = std::result::Result<T, NoiseError>;

/// Main error type for noise engine operations
#[derive(Error, Debug)]
pub enum NoiseError {
    // Platform Errors
    #[error("Audio context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    #[error("Audio context could not be resumed: {reason}")]
    ResumeFailed { reason: String },

    #[cfg(feature = "device")]
    #[error("Output device error: {reason}")]
    Device { reason: String },

    // Signal Errors
    #[error("Invalid noise buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    // Graph Errors
    #[error("Unknown audio node: {node}")]
    UnknownNode { node: u64 },

    #[error("Buffer player {node} already started")]
    PlayerAlreadyStarted { node: u64 },

    #[error("Buffer player {node} already stopped")]
    PlayerAlreadyStopped { node: u64 },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NoiseError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            NoiseError::ContextUnavailable { .. } => "CONTEXT_UNAVAILABLE",
            NoiseError::ResumeFailed { .. } => "RESUME_FAILED",
            #[cfg(feature = "device")]
            NoiseError::Device { .. } => "DEVICE_ERROR",
            NoiseError::InvalidBuffer { .. } => "INVALID_BUFFER",
            NoiseError::InvalidConfig { .. } => "INVALID_CONFIG",
            NoiseError::UnknownNode { .. } => "UNKNOWN_NODE",
            NoiseError::PlayerAlreadyStarted { .. } => "PLAYER_ALREADY_STARTED",
            NoiseError::PlayerAlreadyStopped { .. } => "PLAYER_ALREADY_STOPPED",
            NoiseError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            NoiseError::Io(_) => "IO_ERROR",
            NoiseError::Wav(_) => "WAV_ERROR",
            NoiseError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the engine in a consistent state and the
    /// caller may simply try the operation again later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NoiseError::ResumeFailed { .. }
                | NoiseError::PlayerAlreadyStarted { .. }
                | NoiseError::PlayerAlreadyStopped { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = NoiseError::ContextUnavailable {
            reason: "no audio".to_string(),
        };
        assert_eq!(err.error_code(), "CONTEXT_UNAVAILABLE");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_already_stopped_is_recoverable() {
        let err = NoiseError::PlayerAlreadyStopped { node: 3 };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Buffer player 3 already stopped");
    }

    #[test]
    fn test_invalid_config_is_not_recoverable() {
        let err = NoiseError::InvalidConfig {
            reason: "buffer_seconds too long".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(!err.is_recoverable());
    }
}
