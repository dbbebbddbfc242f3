//! calopix-algorithms: Calorimeter cluster finding.
//!
//! This crate provides:
//! - **`ClusterFinder`** - breadth-first growth of one cluster from a seed,
//!   gated by time coincidence and an expansion cut
//! - **`EventClusterer`** - per-event driver running one finder per seed in
//!   order of decreasing energy, with parallel multi-event batches
//! - **Summaries** - cluster energy, time and weighted centroid
//!
#![warn(missing_docs)]

mod finder;
mod processing;
mod summary;

pub use finder::ClusterFinder;
pub use processing::{cluster_and_summarize, total_statistics, EventClusterer, EventClusters};
pub use summary::{summarize, CentroidWeighting, ClusterSummary};

// Re-export core clustering types
pub use calopix_core::clustering::{
    Cluster, ClusteringConfig, ClusteringStatistics, ExpandMetric, FinderConfig, FinderMode,
};
