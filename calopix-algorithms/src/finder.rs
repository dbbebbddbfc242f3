//! Single-seed cluster finder.
//!
//! Grows a cluster of simply connected crystals outward from a seed with a
//! breadth-first walk over the geometry's neighbor relation. A neighbor
//! joins when it registered a hit in time with the seed, lies within the
//! expansion cut, and does not already belong to another cluster.
//!
//! Working state (visited mask and to-visit queue) is private to the
//! finder. Cross-seed exclusivity goes through the [`ClaimMap`] the caller
//! passes to [`ClusterFinder::form_cluster`].

use std::collections::VecDeque;

use calopix_core::claims::ClaimMap;
use calopix_core::clustering::{Cluster, ExpandMetric, FinderConfig, FinderMode};
use calopix_core::error::{Error, Result};
use calopix_core::geometry::CrystalGeometry;
use calopix_core::hit::{CaloHit, HitSource};
use log::trace;

/// Breadth-first cluster finder for one seed.
///
/// The finder borrows the geometry and the event's hits; both must outlive
/// it, which in practice means one event's processing.
pub struct ClusterFinder<'a, G: ?Sized, S: ?Sized> {
    geometry: &'a G,
    hits: &'a S,
    seed: usize,
    seed_time: f64,
    config: FinderConfig,
    cluster_list: Vec<usize>,
    /// Pending crystals with their hop count from the seed.
    to_visit: VecDeque<(usize, usize)>,
    visited: Vec<bool>,
}

impl<'a, G, S> ClusterFinder<'a, G, S>
where
    G: CrystalGeometry + ?Sized,
    S: HitSource + ?Sized,
{
    /// Creates a finder seeded at `seed`.
    ///
    /// # Errors
    /// - [`Error::InvalidSeed`] if `seed` is out of range or has no hit.
    /// - [`Error::InvalidConfiguration`] for negative or NaN parameters.
    pub fn new(geometry: &'a G, hits: &'a S, seed: usize, config: FinderConfig) -> Result<Self> {
        config.validate()?;
        let count = geometry.crystal_count();
        if seed >= count {
            return Err(Error::InvalidSeed(format!(
                "seed crystal {seed} is out of range ({count} crystals)"
            )));
        }
        let seed_hit = hits
            .hit_at(seed)
            .ok_or_else(|| Error::InvalidSeed(format!("no hit recorded at seed crystal {seed}")))?;

        Ok(Self {
            geometry,
            hits,
            seed,
            seed_time: seed_hit.time,
            config,
            cluster_list: Vec::new(),
            to_visit: VecDeque::new(),
            visited: vec![false; count],
        })
    }

    /// Seed crystal index.
    #[must_use]
    pub fn seed(&self) -> usize {
        self.seed
    }

    /// Time of the seed hit, the reference for the coincidence gate.
    #[must_use]
    pub fn seed_time(&self) -> f64 {
        self.seed_time
    }

    /// Finder parameters.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Crystals of the most recently formed cluster, in discovery order.
    ///
    /// Empty until [`ClusterFinder::form_cluster`] succeeds.
    #[must_use]
    pub fn cluster_list(&self) -> &[usize] {
        &self.cluster_list
    }

    /// Distance of `crystal` from the seed under the configured metric.
    fn distance_from_seed(&self, crystal: usize, hops: usize) -> f64 {
        match self.config.metric {
            #[allow(clippy::cast_precision_loss)]
            ExpandMetric::Hops => hops as f64,
            ExpandMetric::Distance => self.geometry.distance(self.seed, crystal),
        }
    }

    /// Gating predicate: `crystal` has a hit within the time window of the
    /// seed and `distance` is inside the expansion cut.
    ///
    /// Depends only on the hit data and the configuration.
    #[must_use]
    pub fn passes_gate(&self, crystal: usize, distance: f64) -> bool {
        self.gated_hit(crystal, distance).is_some()
    }

    fn gated_hit(&self, crystal: usize, distance: f64) -> Option<&'a CaloHit> {
        let hits: &'a S = self.hits;
        hits.hit_at(crystal).filter(|hit| {
            hit.in_time_with(self.seed_time, self.config.delta_time)
                && distance <= self.config.expand_cut
        })
    }

    fn neighbors_of(&self, crystal: usize) -> &'a [usize] {
        let geometry: &'a G = self.geometry;
        match self.config.mode {
            FinderMode::Offline => geometry.neighbors(crystal),
            FinderMode::Online => geometry.online_neighbors(crystal),
        }
    }

    /// Grows the cluster from the seed and appends it to `out`.
    ///
    /// Every member is claimed in `claims` once the walk completes; on error
    /// `claims` is left untouched.
    ///
    /// # Errors
    /// - [`Error::SeedAlreadyClaimed`] if another cluster owns the seed.
    /// - [`Error::InvalidGeometry`] if a neighbor index is out of range.
    /// - [`Error::InvalidConfiguration`] if `claims` is sized for a
    ///   different geometry.
    pub fn form_cluster(&mut self, claims: &mut ClaimMap, out: &mut Vec<Cluster>) -> Result<()> {
        let count = self.geometry.crystal_count();
        if claims.len() != count {
            return Err(Error::InvalidConfiguration(format!(
                "claim map tracks {} crystals, geometry has {count}",
                claims.len()
            )));
        }
        if let Some(cluster) = claims.owner(self.seed) {
            return Err(Error::SeedAlreadyClaimed {
                seed: self.seed,
                cluster,
            });
        }

        self.visited.fill(false);
        self.cluster_list.clear();
        self.to_visit.clear();

        self.visited[self.seed] = true;
        self.cluster_list.push(self.seed);
        self.to_visit.push_back((self.seed, 0));

        while let Some((visit, hops)) = self.to_visit.pop_front() {
            for &neighbor in self.neighbors_of(visit) {
                if neighbor >= count {
                    self.cluster_list.clear();
                    self.to_visit.clear();
                    return Err(Error::InvalidGeometry {
                        index: visit,
                        neighbor,
                        count,
                    });
                }
                if self.visited[neighbor] {
                    continue;
                }
                self.visited[neighbor] = true;

                if claims.is_claimed(neighbor) {
                    continue;
                }
                let distance = self.distance_from_seed(neighbor, hops + 1);
                let Some(hit) = self.gated_hit(neighbor, distance) else {
                    continue;
                };

                trace!(
                    "seed {}: crystal {neighbor} joins at {} hops (dt = {:.3})",
                    self.seed,
                    hops + 1,
                    hit.time - self.seed_time
                );
                self.cluster_list.push(neighbor);
                if hit.energy >= self.config.min_expand_energy {
                    self.to_visit.push_back((neighbor, hops + 1));
                }
            }
        }

        let id = claims.next_cluster_id();
        for &crystal in &self.cluster_list {
            claims.claim(crystal, id);
        }
        out.push(Cluster {
            id,
            crystals: self.cluster_list.clone(),
        });
        Ok(())
    }
}
