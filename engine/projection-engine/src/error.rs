//! Error types for the projection engine

use thiserror::Error;

/// Errors surfaced by the projection engine.
///
/// Missing or insufficient *data* is never an error here: modifiers fall
/// back to neutral and the estimator degrades to a zero result. Only
/// statistically invalid configuration and series misuse are rejected.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Configuration failed validation. Carries every violation found,
    /// not just the first one.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// Observation appended out of chronological order.
    #[error("observation for period {period} is not after period {last}")]
    OutOfOrder { period: u32, last: u32 },

    /// Configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl ProjectionError {
    /// Create a config-load error from any displayable cause.
    pub fn config_load(msg: impl Into<String>) -> Self {
        Self::ConfigLoad(msg.into())
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
