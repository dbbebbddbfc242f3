//! calopix-core: Core traits and types for calorimeter crystal clustering.
//!
//! This crate provides the foundational abstractions shared by the
//! clustering engine: hits, per-event hit storage, the crystal geometry
//! provider, per-event crystal claims, and cluster configuration.
//!

pub mod claims;
pub mod clustering;
pub mod error;
pub mod event;
pub mod geometry;
pub mod hit;
pub mod spatial;

pub use claims::{ClaimMap, CrystalClaim};
pub use clustering::{
    Cluster, ClusteringConfig, ClusteringStatistics, ExpandMetric, FinderConfig, FinderMode,
};
pub use error::{Error, Result};
pub use event::EventHits;
pub use geometry::{Crystal, CrystalGeometry, CrystalMap};
pub use hit::{CaloHit, HitSource};
