//! Crystal geometry: positions and the static neighbor relation.

use log::debug;
use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::spatial::SpatialGrid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only view of a calorimeter's crystals and their adjacency.
///
/// This trait is what the clustering engine consumes; it never needs to
/// know how the geometry was built.
pub trait CrystalGeometry: Send + Sync {
    /// Total number of crystals.
    fn crystal_count(&self) -> usize;

    /// First-ring neighbors of `crystal`.
    fn neighbors(&self, crystal: usize) -> &[usize];

    /// Reduced neighbor relation used by online (trigger-level) clustering.
    ///
    /// Defaults to the full relation.
    fn online_neighbors(&self, crystal: usize) -> &[usize] {
        self.neighbors(crystal)
    }

    /// Position of the crystal center (mm).
    fn position(&self, crystal: usize) -> Vector3<f64>;

    /// Euclidean distance between two crystal centers.
    fn distance(&self, a: usize, b: usize) -> f64 {
        (self.position(a) - self.position(b)).norm()
    }
}

/// A single crystal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Crystal {
    /// Center position (mm).
    pub position: Vector3<f64>,
    /// Indices of adjacent crystals.
    #[cfg_attr(feature = "serde", serde(default))]
    pub neighbors: Vec<usize>,
}

impl Crystal {
    /// Creates a crystal with the given position and neighbors.
    #[must_use]
    pub fn new(position: Vector3<f64>, neighbors: Vec<usize>) -> Self {
        Self {
            position,
            neighbors,
        }
    }
}

/// Concrete geometry provider holding every crystal in memory.
#[derive(Debug, Clone, Default)]
pub struct CrystalMap {
    crystals: Vec<Crystal>,
    online: Option<Vec<Vec<usize>>>,
}

fn validate_relation<'a, I>(count: usize, lists: I) -> Result<()>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    for (index, list) in lists.into_iter().enumerate() {
        if let Some(&neighbor) = list.iter().find(|&&n| n >= count) {
            return Err(Error::InvalidGeometry {
                index,
                neighbor,
                count,
            });
        }
    }
    Ok(())
}

impl CrystalMap {
    /// Builds a geometry from explicit crystals.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] if any neighbor index is out of range.
    pub fn new(crystals: Vec<Crystal>) -> Result<Self> {
        validate_relation(
            crystals.len(),
            crystals.iter().map(|c| c.neighbors.as_slice()),
        )?;
        Ok(Self {
            crystals,
            online: None,
        })
    }

    /// Builds a geometry from positions, linking every pair of crystals whose
    /// centers are closer than `neighbor_radius`. The relation is symmetric.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] for a non-positive or
    /// non-finite radius, or for a position that is non-finite or too far
    /// from the origin relative to the radius.
    pub fn from_positions(positions: &[Vector3<f64>], neighbor_radius: f64) -> Result<Self> {
        if neighbor_radius <= 0.0 || !neighbor_radius.is_finite() {
            return Err(Error::config(format!(
                "neighbor_radius must be positive and finite, got {neighbor_radius}"
            )));
        }

        let mut grid = SpatialGrid::new(neighbor_radius);
        for (i, p) in positions.iter().enumerate() {
            if !grid.insert(p, i) {
                return Err(Error::config(format!(
                    "crystal {i} position ({}, {}, {}) is out of range for radius {neighbor_radius}",
                    p.x, p.y, p.z
                )));
            }
        }

        let crystals: Vec<Crystal> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut neighbors: Vec<usize> = grid
                    .query_neighborhood(p)
                    .into_iter()
                    .filter(|&j| j != i && (positions[j] - p).norm() < neighbor_radius)
                    .collect();
                neighbors.sort_unstable();
                Crystal::new(*p, neighbors)
            })
            .collect();

        debug!(
            "derived neighbor relation for {} crystals (radius {neighbor_radius} mm)",
            crystals.len()
        );
        Ok(Self {
            crystals,
            online: None,
        })
    }

    /// Installs a reduced neighbor relation for online clustering.
    ///
    /// # Errors
    /// Fails if the list count does not match the crystal count or an
    /// index is out of range.
    pub fn with_online_neighbors(mut self, online: Vec<Vec<usize>>) -> Result<Self> {
        let count = self.crystals.len();
        if online.len() != count {
            return Err(Error::config(format!(
                "online relation lists {} crystals, geometry has {count}",
                online.len()
            )));
        }
        validate_relation(count, online.iter().map(Vec::as_slice))?;
        self.online = Some(online);
        Ok(self)
    }

    /// Returns the crystal at `index`.
    #[must_use]
    pub fn crystal(&self, index: usize) -> Option<&Crystal> {
        self.crystals.get(index)
    }

    /// All crystals in index order.
    #[must_use]
    pub fn crystals(&self) -> &[Crystal] {
        &self.crystals
    }

    /// Second-ring neighbors: crystals exactly two hops from `index`.
    #[must_use]
    pub fn next_neighbors(&self, index: usize) -> Vec<usize> {
        let first = self.neighbors(index);
        let mut ring: Vec<usize> = first
            .iter()
            .flat_map(|&n| self.neighbors(n).iter().copied())
            .filter(|&m| m != index && !first.contains(&m))
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }
}

impl CrystalGeometry for CrystalMap {
    fn crystal_count(&self) -> usize {
        self.crystals.len()
    }

    fn neighbors(&self, crystal: usize) -> &[usize] {
        self.crystals
            .get(crystal)
            .map_or(&[][..], |c| c.neighbors.as_slice())
    }

    fn online_neighbors(&self, crystal: usize) -> &[usize] {
        match &self.online {
            Some(lists) => lists.get(crystal).map_or(&[][..], Vec::as_slice),
            None => self.neighbors(crystal),
        }
    }

    fn position(&self, crystal: usize) -> Vector3<f64> {
        self.crystals
            .get(crystal)
            .map_or_else(Vector3::zeros, |c| c.position)
    }
}
