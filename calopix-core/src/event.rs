//! Per-event hit storage.
//!
//! `EventHits` is a dense arena indexed by crystal id: slot `i` holds the
//! hit crystal `i` registered in this event, or nothing. Lookups by crystal
//! are O(1), which is what neighbor-driven clustering needs.

use crate::error::{Error, Result};
use crate::hit::{CaloHit, HitSource};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hits of one event, indexed by crystal.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventHits {
    slots: Vec<Option<CaloHit>>,
    len: usize,
}

impl EventHits {
    /// Creates an empty event for a geometry with `crystal_count` crystals.
    #[must_use]
    pub fn new(crystal_count: usize) -> Self {
        Self {
            slots: vec![None; crystal_count],
            len: 0,
        }
    }

    /// Builds an event from a list of hits.
    ///
    /// # Errors
    /// Fails if a hit references a crystal outside the geometry or if two
    /// hits share a crystal.
    pub fn from_hits<I>(crystal_count: usize, hits: I) -> Result<Self>
    where
        I: IntoIterator<Item = CaloHit>,
    {
        let mut event = Self::new(crystal_count);
        for hit in hits {
            event.insert(hit)?;
        }
        Ok(event)
    }

    /// Records a hit.
    ///
    /// # Errors
    /// Returns [`Error::HitOutOfRange`] or [`Error::DuplicateHit`].
    pub fn insert(&mut self, hit: CaloHit) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(hit.crystal)
            .ok_or(Error::HitOutOfRange {
                crystal: hit.crystal,
                count,
            })?;
        if slot.is_some() {
            return Err(Error::DuplicateHit(hit.crystal));
        }
        *slot = Some(hit);
        self.len += 1;
        Ok(())
    }

    /// Number of crystals the event was sized for.
    #[must_use]
    pub fn crystal_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of hits in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no crystal registered a signal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over recorded hits in crystal order.
    pub fn iter(&self) -> impl Iterator<Item = &CaloHit> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Removes all hits, keeping the crystal count.
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.len = 0;
    }
}

impl HitSource for EventHits {
    #[inline]
    fn hit_at(&self, crystal: usize) -> Option<&CaloHit> {
        self.slots.get(crystal).and_then(Option::as_ref)
    }
}
