//! Error types for engagelens-core

use thiserror::Error;

/// Main error type for the engagelens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed caller input (bad window, unknown section, oversized window)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Storage could not be read; distinct from a legitimately empty result
    #[error("data unavailable: {0}")]
    DataUnavailable(String),
}

impl Error {
    /// Whether this error was caused by the caller's input.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Error::InvalidParameter(_))
    }
}

/// Result type alias for engagelens-core
pub type Result<T> = std::result::Result<T, Error>;
