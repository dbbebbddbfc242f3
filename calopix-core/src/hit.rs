//! Hit traits and types for calorimeter crystal data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy deposit recorded in one crystal during one event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaloHit {
    /// Index of the crystal that registered the signal.
    pub crystal: usize,
    /// Hit time (nanoseconds).
    pub time: f64,
    /// Deposited energy (MeV).
    pub energy: f64,
}

impl CaloHit {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(crystal: usize, time: f64, energy: f64) -> Self {
        Self {
            crystal,
            time,
            energy,
        }
    }

    /// Absolute time difference to a reference time.
    #[inline]
    #[must_use]
    pub fn time_diff(&self, reference: f64) -> f64 {
        (self.time - reference).abs()
    }

    /// Returns true if this hit lies within `half_window` of `reference`.
    ///
    /// The window is closed: a difference equal to `half_window` passes.
    #[inline]
    #[must_use]
    pub fn in_time_with(&self, reference: f64, half_window: f64) -> bool {
        self.time_diff(reference) <= half_window
    }
}

/// Per-event lookup from crystal index to the hit it registered.
///
/// Implementations are borrowed for the duration of one event; the
/// clustering engine never stores hits, only crystal indices.
pub trait HitSource: Send + Sync {
    /// Returns the hit recorded at `crystal`, if any.
    fn hit_at(&self, crystal: usize) -> Option<&CaloHit>;

    /// Returns true if `crystal` registered a signal.
    #[inline]
    fn has_hit(&self, crystal: usize) -> bool {
        self.hit_at(crystal).is_some()
    }
}
