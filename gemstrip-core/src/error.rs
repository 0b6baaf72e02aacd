//! Error types for gemstrip-core.

use thiserror::Error;

/// Result type alias for gemstrip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for gemstrip operations.
///
/// Only setup problems are errors. Per-event anomalies (bad multiplicity,
/// unmatched planes, failed fits) resolve to empty results instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Charge-ratio window with an empty or non-finite interval.
    #[error("invalid charge-ratio window: ({low}, {high})")]
    InvalidRatioWindow { low: f64, high: f64 },

    /// Cluster multiplicity bounds that cannot be satisfied.
    #[error("invalid clusters-per-plane bounds: min {min}, max {max}")]
    InvalidAcceptance { min: usize, max: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
