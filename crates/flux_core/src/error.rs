use thiserror::Error;

use crate::types::ParticleId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced to callers of the simulation core.
///
/// Degenerate numerical situations (coincident centers, NaN forces) are not
/// represented here: they are sanitized inside the tick and only counted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Rejected configuration or particle parameters.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Unknown or removed particle id.
    #[error("particle {0} not found")]
    NotFound(ParticleId),

    /// Malformed import record.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl SimError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}
