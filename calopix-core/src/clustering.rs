//! Clustering types and configuration.

use crate::error::{ensure_non_negative, Result};
use crate::hit::{CaloHit, HitSource};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cluster of simply connected crystals.
///
/// Crystals are stored as indices in discovery order: the seed first, then
/// every other member in breadth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Cluster id, unique within its event.
    pub id: usize,
    /// Crystal indices belonging to this cluster.
    pub crystals: Vec<usize>,
}

impl Cluster {
    /// Creates a cluster holding only its seed.
    #[must_use]
    pub fn from_seed(id: usize, seed: usize) -> Self {
        Self {
            id,
            crystals: vec![seed],
        }
    }

    /// The seed crystal; `None` only for a hand-built empty cluster.
    #[must_use]
    pub fn seed(&self) -> Option<usize> {
        self.crystals.first().copied()
    }

    /// Adds a crystal to the cluster.
    pub fn push(&mut self, crystal: usize) {
        self.crystals.push(crystal);
    }

    /// Returns the number of crystals in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.crystals.len()
    }

    /// False for any cluster produced by a finder, which holds at least its
    /// seed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crystals.is_empty()
    }

    /// Returns true if `crystal` belongs to this cluster.
    #[must_use]
    pub fn contains(&self, crystal: usize) -> bool {
        self.crystals.contains(&crystal)
    }

    /// Returns an iterator over the crystal indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.crystals.iter().copied()
    }

    /// Resolves members to their hits in `hits`.
    pub fn hits<'a, S: HitSource>(&'a self, hits: &'a S) -> impl Iterator<Item = &'a CaloHit> + 'a {
        self.crystals.iter().filter_map(move |&c| hits.hit_at(c))
    }

    /// Total energy of the member hits.
    #[must_use]
    pub fn energy<S: HitSource>(&self, hits: &S) -> f64 {
        self.hits(hits).map(|h| h.energy).sum()
    }
}

/// How distance from the seed is measured against the expansion cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExpandMetric {
    /// Graph hops through the neighbor relation.
    #[default]
    Hops,
    /// Euclidean distance between crystal centers (mm).
    Distance,
}

/// Which neighbor relation the finder walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FinderMode {
    /// Full reconstruction pass.
    #[default]
    Offline,
    /// Trigger-level pass over the reduced relation.
    Online,
}

/// Parameters of a single-seed cluster finder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FinderConfig {
    /// Time-coincidence half window around the seed time (ns).
    pub delta_time: f64,
    /// Maximum distance from the seed, in units of `metric`.
    pub expand_cut: f64,
    /// Distance measure used with `expand_cut`.
    pub metric: ExpandMetric,
    /// Neighbor relation to walk.
    pub mode: FinderMode,
    /// Members below this energy (MeV) join but are not expanded further.
    pub min_expand_energy: f64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            delta_time: 10.0,
            expand_cut: f64::INFINITY,
            metric: ExpandMetric::Hops,
            mode: FinderMode::Offline,
            min_expand_energy: 0.0,
        }
    }
}

impl FinderConfig {
    /// Creates a finder configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-coincidence half window.
    #[must_use]
    pub fn with_delta_time(mut self, delta_time: f64) -> Self {
        self.delta_time = delta_time;
        self
    }

    /// Sets the expansion cut.
    #[must_use]
    pub fn with_expand_cut(mut self, expand_cut: f64) -> Self {
        self.expand_cut = expand_cut;
        self
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: ExpandMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Switches between online and offline neighbor relations.
    #[must_use]
    pub fn with_mode(mut self, mode: FinderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the minimum energy a member needs to be expanded further.
    #[must_use]
    pub fn with_min_expand_energy(mut self, energy: f64) -> Self {
        self.min_expand_energy = energy;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidConfiguration`] for negative or NaN values.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("delta_time", self.delta_time)?;
        ensure_non_negative("expand_cut", self.expand_cut)?;
        ensure_non_negative("min_expand_energy", self.min_expand_energy)
    }
}

/// Configuration of the per-event clustering driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringConfig {
    /// Parameters handed to every cluster finder.
    pub finder: FinderConfig,
    /// Hits must be strictly above this energy (MeV) to seed a cluster.
    pub min_seed_energy: f64,
    /// Minimum number of crystals for a cluster to be reported.
    pub min_cluster_size: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            finder: FinderConfig::default(),
            min_seed_energy: 0.0,
            min_cluster_size: 1,
        }
    }
}

impl ClusteringConfig {
    /// Creates a clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the finder parameters.
    #[must_use]
    pub fn with_finder(mut self, finder: FinderConfig) -> Self {
        self.finder = finder;
        self
    }

    /// Sets the seed energy threshold.
    #[must_use]
    pub fn with_min_seed_energy(mut self, energy: f64) -> Self {
        self.min_seed_energy = energy;
        self
    }

    /// Sets the minimum reported cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidConfiguration`] for negative or NaN values.
    pub fn validate(&self) -> Result<()> {
        self.finder.validate()?;
        ensure_non_negative("min_seed_energy", self.min_seed_energy)
    }
}

/// Counters accumulated while clustering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Hits seen.
    pub hits_processed: usize,
    /// Clusters reported.
    pub clusters_found: usize,
    /// Hits absorbed by reported clusters.
    pub hits_clustered: usize,
    /// Clusters formed but dropped by the size filter.
    pub clusters_rejected: usize,
}

impl ClusteringStatistics {
    /// Hits not absorbed by any reported cluster.
    #[must_use]
    pub fn hits_unclustered(&self) -> usize {
        self.hits_processed.saturating_sub(self.hits_clustered)
    }

    /// Adds another set of counters to this one.
    pub fn merge(&mut self, other: &Self) {
        self.hits_processed += other.hits_processed;
        self.clusters_found += other.clusters_found;
        self.hits_clustered += other.hits_clustered;
        self.clusters_rejected += other.clusters_rejected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHits;
    use approx::assert_relative_eq;

    #[test]
    fn test_cluster_operations() {
        let mut cluster = Cluster::from_seed(0, 5);
        cluster.push(4);
        cluster.push(6);

        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.seed(), Some(5));
        assert!(cluster.contains(6));
        assert!(!cluster.contains(7));
        assert!(!cluster.is_empty());
        assert_eq!(cluster.iter().collect::<Vec<_>>(), vec![5, 4, 6]);
    }

    #[test]
    fn test_cluster_energy() {
        let hits = EventHits::from_hits(
            8,
            [
                CaloHit::new(5, 0.0, 30.0),
                CaloHit::new(4, 1.0, 12.5),
                CaloHit::new(6, 2.0, 7.5),
            ],
        )
        .unwrap();
        let mut cluster = Cluster::from_seed(0, 5);
        cluster.push(4);
        cluster.push(6);
        assert_relative_eq!(cluster.energy(&hits), 50.0);
        assert_eq!(cluster.hits(&hits).count(), 3);
    }

    #[test]
    fn test_finder_config() {
        let config = FinderConfig::new()
            .with_delta_time(5.0)
            .with_expand_cut(2.0)
            .with_metric(ExpandMetric::Distance)
            .with_mode(FinderMode::Online)
            .with_min_expand_energy(1.0);

        assert_relative_eq!(config.delta_time, 5.0);
        assert_relative_eq!(config.expand_cut, 2.0);
        assert_eq!(config.metric, ExpandMetric::Distance);
        assert_eq!(config.mode, FinderMode::Online);
        assert!(config.validate().is_ok());

        assert!(FinderConfig::new().with_delta_time(-1.0).validate().is_err());
        assert!(FinderConfig::new().with_expand_cut(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_clustering_config() {
        let config = ClusteringConfig::new()
            .with_min_seed_energy(10.0)
            .with_min_cluster_size(2);
        assert_eq!(config.min_cluster_size, 2);
        assert!(config.validate().is_ok());
        assert!(ClusteringConfig::new()
            .with_min_seed_energy(-0.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_statistics_merge() {
        let mut total = ClusteringStatistics::default();
        total.merge(&ClusteringStatistics {
            hits_processed: 10,
            clusters_found: 2,
            hits_clustered: 7,
            clusters_rejected: 1,
        });
        total.merge(&ClusteringStatistics {
            hits_processed: 5,
            clusters_found: 1,
            hits_clustered: 5,
            clusters_rejected: 0,
        });
        assert_eq!(total.hits_processed, 15);
        assert_eq!(total.hits_unclustered(), 3);
        assert_eq!(total.clusters_rejected, 1);
    }
}
