//! Geometry error types.

use thiserror::Error;

/// Result type for geometry construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry construction errors.
///
/// Queries never fail; only building a surface from bad parameters does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A parameter is out of its valid range.
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),

    /// A vector that must define a direction has zero (or non-finite) length.
    #[error("{0} has zero or non-finite length")]
    ZeroVector(&'static str),
}

pub(crate) fn ensure_half_length(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}
