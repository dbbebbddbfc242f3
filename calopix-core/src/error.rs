//! Error types for calopix-core.

use thiserror::Error;

/// Result type alias for calopix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for calopix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A configuration parameter is out of its valid range.
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),

    /// A neighbor relation points outside the crystal collection.
    #[error("invalid geometry: crystal {index} lists neighbor {neighbor}, but only {count} crystals exist")]
    InvalidGeometry {
        /// Crystal whose neighbor list is malformed.
        index: usize,
        /// Offending neighbor index.
        neighbor: usize,
        /// Number of crystals in the geometry.
        count: usize,
    },

    /// The seed does not reference a crystal with a hit.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// The seed has already been absorbed by another cluster in this event.
    #[error("seed crystal {seed} is already claimed by cluster {cluster}")]
    SeedAlreadyClaimed {
        /// Seed crystal index.
        seed: usize,
        /// Cluster that owns the crystal.
        cluster: usize,
    },

    /// Two hits were recorded for the same crystal.
    #[error("duplicate hit for crystal {0}")]
    DuplicateHit(usize),

    /// A hit references a crystal outside the geometry.
    #[error("hit references crystal {crystal}, but only {count} crystals exist")]
    HitOutOfRange {
        /// Crystal index carried by the hit.
        crystal: usize,
        /// Number of crystals in the geometry.
        count: usize,
    },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Checks that a parameter is non-negative. Positive infinity is accepted.
///
/// # Errors
/// Returns [`Error::InvalidConfiguration`] for negative or NaN values.
pub fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("delta_time", 0.0).is_ok());
        assert!(ensure_non_negative("delta_time", 5.0).is_ok());
        assert!(ensure_non_negative("delta_time", -1.0).is_err());
        assert!(ensure_non_negative("delta_time", f64::NAN).is_err());
        assert!(ensure_non_negative("delta_time", f64::NEG_INFINITY).is_err());
        assert!(ensure_non_negative("expand_cut", f64::INFINITY).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidGeometry {
            index: 3,
            neighbor: 12,
            count: 10,
        };
        assert_eq!(
            err.to_string(),
            "invalid geometry: crystal 3 lists neighbor 12, but only 10 crystals exist"
        );
    }
}
