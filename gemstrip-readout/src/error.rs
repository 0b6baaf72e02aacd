//! Readout error types.

use thiserror::Error;

/// Result type for readout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Readout error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed raw strip record.
    #[error("bad record: {0}")]
    BadRecord(String),

    /// Detector name missing from the detector table.
    #[error("unknown detector: {0}")]
    UnknownDetector(String),

    /// Run configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Run configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] gemstrip_core::Error),
}
