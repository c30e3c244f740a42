//! Error types shared by recording, storage and playback

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording, persisting or replaying a macro
#[derive(Error, Debug)]
pub enum MacroError {
    #[error("Macro file not found: {}", .0.display())]
    FileAbsent(PathBuf),

    #[error("Invalid JSON in macro file {}: {source}", path.display())]
    CorruptFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown mouse button: {0}")]
    UnknownMouseButton(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid speed factor: {0} (must be a finite number above zero)")]
    InvalidSpeed(f64),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl MacroError {
    /// Whether this error means the requested file does not exist
    pub fn is_absent(&self) -> bool {
        matches!(self, MacroError::FileAbsent(_))
    }

    /// Whether this error means the file exists but is not valid JSON
    pub fn is_corrupt(&self) -> bool {
        matches!(self, MacroError::CorruptFormat { .. })
    }
}

/// Result type for macro operations
pub type MacroResult<T> = Result<T, MacroError>;
