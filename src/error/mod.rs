//! Error handling module for vtrim

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Application level error type
#[derive(Error, Debug)]
pub enum TrimError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid session file contents
    #[error("Session error: {message}")]
    Session { message: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected seconds, MM:SS.ms or HH:MM:SS.ms")]
    InvalidTimeFormat { time: String },

    /// Domain rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for vtrim operations
pub type TrimResult<T> = std::result::Result<T, TrimError>;
