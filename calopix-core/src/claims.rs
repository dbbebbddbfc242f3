//! Per-event crystal ownership.
//!
//! Each crystal belongs to at most one cluster per event. The claim map is
//! handed to every cluster finder by `&mut`, so only one finder can grow a
//! cluster against it at a time.

/// Ownership state of one crystal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrystalClaim {
    /// Not part of any cluster yet.
    #[default]
    Free,
    /// Absorbed by the cluster with the given id.
    Claimed(usize),
}

/// Dense claim state for every crystal of one event.
#[derive(Debug, Clone, Default)]
pub struct ClaimMap {
    claims: Vec<CrystalClaim>,
    next_cluster_id: usize,
    claimed: usize,
}

impl ClaimMap {
    /// Creates a map with every crystal free.
    #[must_use]
    pub fn new(crystal_count: usize) -> Self {
        Self {
            claims: vec![CrystalClaim::Free; crystal_count],
            next_cluster_id: 0,
            claimed: 0,
        }
    }

    /// Number of crystals tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true if the map tracks no crystals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claim state of `crystal`. Out-of-range crystals report `Free`.
    #[must_use]
    pub fn state(&self, crystal: usize) -> CrystalClaim {
        self.claims.get(crystal).copied().unwrap_or_default()
    }

    /// Returns the owning cluster of `crystal`, if any.
    #[must_use]
    pub fn owner(&self, crystal: usize) -> Option<usize> {
        match self.state(crystal) {
            CrystalClaim::Claimed(id) => Some(id),
            CrystalClaim::Free => None,
        }
    }

    /// Returns true if `crystal` already belongs to a cluster.
    #[must_use]
    pub fn is_claimed(&self, crystal: usize) -> bool {
        self.owner(crystal).is_some()
    }

    /// Reserves a fresh cluster id.
    pub fn next_cluster_id(&mut self) -> usize {
        let id = self.next_cluster_id;
        self.next_cluster_id += 1;
        id
    }

    /// Assigns `crystal` to `cluster`. Returns false if it was already taken
    /// or lies outside the map.
    pub fn claim(&mut self, crystal: usize, cluster: usize) -> bool {
        match self.claims.get_mut(crystal) {
            Some(slot) if *slot == CrystalClaim::Free => {
                *slot = CrystalClaim::Claimed(cluster);
                self.claimed += 1;
                true
            }
            _ => false,
        }
    }

    /// Number of crystals claimed so far.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed
    }

    /// Frees every crystal and restarts cluster numbering.
    pub fn reset(&mut self) {
        self.claims.fill(CrystalClaim::Free);
        self.next_cluster_id = 0;
        self.claimed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut claims = ClaimMap::new(4);
        let id = claims.next_cluster_id();
        assert!(claims.claim(2, id));
        assert!(!claims.claim(2, id + 1));
        assert_eq!(claims.owner(2), Some(id));
        assert_eq!(claims.claimed_count(), 1);
        assert!(!claims.claim(9, id));
    }

    #[test]
    fn test_reset() {
        let mut claims = ClaimMap::new(3);
        let id = claims.next_cluster_id();
        claims.claim(0, id);
        claims.reset();
        assert!(!claims.is_claimed(0));
        assert_eq!(claims.next_cluster_id(), 0);
        assert_eq!(claims.claimed_count(), 0);
    }
}
