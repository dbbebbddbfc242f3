//! Event-level clustering driver.
//!
//! Runs one [`ClusterFinder`] per seed, visiting candidate seeds in order
//! of decreasing energy. A single [`ClaimMap`] is shared by every finder of
//! an event, so each crystal ends up in at most one cluster and no crystal
//! seeds twice. Events are independent and can be processed in parallel.

use calopix_core::claims::ClaimMap;
use calopix_core::clustering::{Cluster, ClusteringConfig, ClusteringStatistics};
use calopix_core::error::{Error, Result};
use calopix_core::event::EventHits;
use calopix_core::geometry::CrystalGeometry;
use log::debug;
use rayon::prelude::*;

use crate::finder::ClusterFinder;
use crate::summary::{summarize, CentroidWeighting, ClusterSummary};

/// Clusters found in one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventClusters {
    /// Reported clusters, in seed order.
    pub clusters: Vec<Cluster>,
    /// Counters for this event.
    pub statistics: ClusteringStatistics,
}

/// Per-event clustering driver.
#[derive(Debug, Clone, Default)]
pub struct EventClusterer {
    config: ClusteringConfig,
}

impl EventClusterer {
    /// Creates a driver.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] for negative or NaN parameters.
    pub fn new(config: ClusteringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Driver parameters.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Candidate seeds: crystals above the seed threshold, by decreasing
    /// energy, ties broken by crystal index.
    #[must_use]
    pub fn seed_order(&self, hits: &EventHits) -> Vec<usize> {
        let mut seeds: Vec<(usize, f64)> = hits
            .iter()
            .filter(|h| h.energy > self.config.min_seed_energy)
            .map(|h| (h.crystal, h.energy))
            .collect();
        seeds.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        seeds.into_iter().map(|(crystal, _)| crystal).collect()
    }

    /// Clusters one event.
    ///
    /// # Errors
    /// Fails if the event was sized for a different geometry, or with any
    /// error raised by a finder (malformed geometry).
    pub fn cluster_event<G>(&self, geometry: &G, hits: &EventHits) -> Result<EventClusters>
    where
        G: CrystalGeometry + ?Sized,
    {
        let count = geometry.crystal_count();
        if hits.crystal_count() != count {
            return Err(Error::InvalidConfiguration(format!(
                "event holds {} crystal slots, geometry has {count}",
                hits.crystal_count()
            )));
        }

        let mut claims = ClaimMap::new(count);
        let mut formed = Vec::new();
        for seed in self.seed_order(hits) {
            if claims.is_claimed(seed) {
                continue;
            }
            let mut finder = ClusterFinder::new(geometry, hits, seed, self.config.finder.clone())?;
            finder.form_cluster(&mut claims, &mut formed)?;
        }

        let mut statistics = ClusteringStatistics {
            hits_processed: hits.len(),
            ..Default::default()
        };
        let min_size = self.config.min_cluster_size;
        let clusters: Vec<Cluster> = formed
            .into_iter()
            .filter(|cluster| {
                let keep = cluster.len() >= min_size;
                if !keep {
                    statistics.clusters_rejected += 1;
                }
                keep
            })
            .collect();
        statistics.clusters_found = clusters.len();
        statistics.hits_clustered = clusters.iter().map(Cluster::len).sum();

        debug!(
            "event: {} hits -> {} clusters ({} rejected by size)",
            statistics.hits_processed, statistics.clusters_found, statistics.clusters_rejected
        );
        Ok(EventClusters {
            clusters,
            statistics,
        })
    }

    /// Clusters a batch of events in parallel.
    ///
    /// # Errors
    /// Returns the first error raised by any event.
    pub fn cluster_events<G>(&self, geometry: &G, events: &[EventHits]) -> Result<Vec<EventClusters>>
    where
        G: CrystalGeometry + ?Sized,
    {
        events
            .par_iter()
            .map(|hits| self.cluster_event(geometry, hits))
            .collect()
    }
}

/// Cluster one event, then summarize every reported cluster.
///
/// # Errors
/// Same as [`EventClusterer::cluster_event`], plus configuration validation.
pub fn cluster_and_summarize<G>(
    geometry: &G,
    hits: &EventHits,
    config: &ClusteringConfig,
    weighting: CentroidWeighting,
) -> Result<(Vec<ClusterSummary>, ClusteringStatistics)>
where
    G: CrystalGeometry + ?Sized,
{
    let result = EventClusterer::new(config.clone())?.cluster_event(geometry, hits)?;
    let summaries = result
        .clusters
        .iter()
        .filter_map(|cluster| summarize(cluster, geometry, hits, weighting))
        .collect();
    Ok((summaries, result.statistics))
}

/// Merge per-event statistics into a total.
#[must_use]
pub fn total_statistics(results: &[EventClusters]) -> ClusteringStatistics {
    results
        .iter()
        .fold(ClusteringStatistics::default(), |mut total, event| {
            total.merge(&event.statistics);
            total
        })
}
