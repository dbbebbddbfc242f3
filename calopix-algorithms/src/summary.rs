//! Cluster summaries: energy, time and centroid.
//!
//! Centroids are energy-weighted averages of crystal centers. Two weighting
//! schemes are available:
//! 1. Linear: `w_i = E_i`
//! 2. Logarithmic: `w_i = max(0, w0 + ln(E_i / E_total))`, which suppresses
//!    the low-energy tail of a shower. Falls back to linear weights when
//!    every logarithmic weight vanishes.
#![allow(clippy::module_name_repetitions)]

use calopix_core::clustering::Cluster;
use calopix_core::geometry::CrystalGeometry;
use calopix_core::hit::HitSource;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Centroid weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CentroidWeighting {
    /// Weight by deposited energy.
    #[default]
    Linear,
    /// Logarithmic weighting with cutoff parameter `w0`.
    Logarithmic {
        /// Cutoff parameter; typical values are 4 to 5.
        w0: f64,
    },
}

/// Reconstructed quantities of one cluster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterSummary {
    /// Cluster id within its event.
    pub id: usize,
    /// Seed crystal.
    pub seed: usize,
    /// Number of crystals.
    pub size: usize,
    /// Summed energy (MeV).
    pub energy: f64,
    /// Seed hit time (ns).
    pub time: f64,
    /// Energy-weighted centroid (mm).
    pub centroid: Vector3<f64>,
}

fn weighted_centroid<I>(members: I) -> Option<Vector3<f64>>
where
    I: Iterator<Item = (Vector3<f64>, f64)>,
{
    let (sum, norm) = members
        .filter(|(_, w)| *w > 0.0)
        .fold((Vector3::zeros(), 0.0), |(sum, norm), (p, w)| (sum + p * w, norm + w));
    (norm > 0.0).then(|| sum / norm)
}

/// Summarizes `cluster` using crystal positions from `geometry`.
///
/// Members without a hit in `hits` are ignored. Returns `None` for an
/// empty cluster.
pub fn summarize<G, S>(
    cluster: &Cluster,
    geometry: &G,
    hits: &S,
    weighting: CentroidWeighting,
) -> Option<ClusterSummary>
where
    G: CrystalGeometry + ?Sized,
    S: HitSource + ?Sized,
{
    let members: Vec<(Vector3<f64>, f64)> = cluster
        .crystals
        .iter()
        .filter_map(|&c| hits.hit_at(c).map(|h| (geometry.position(c), h.energy)))
        .collect();
    let energy: f64 = members.iter().map(|(_, e)| e).sum();
    let seed = cluster.seed()?;

    let linear = || weighted_centroid(members.iter().copied());
    let centroid = match weighting {
        CentroidWeighting::Linear => linear(),
        CentroidWeighting::Logarithmic { w0 } if energy > 0.0 => weighted_centroid(
            members
                .iter()
                .map(|&(p, e)| (p, (w0 + (e / energy).ln()).max(0.0))),
        )
        .or_else(linear),
        CentroidWeighting::Logarithmic { .. } => linear(),
    }
    .unwrap_or_else(|| geometry.position(seed));

    Some(ClusterSummary {
        id: cluster.id,
        seed,
        size: cluster.len(),
        energy,
        time: hits.hit_at(seed).map_or(f64::NAN, |h| h.time),
        centroid,
    })
}
