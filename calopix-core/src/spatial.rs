//! Spatial indexing for neighbor derivation.
//!
//! Used when a geometry is built from crystal positions alone: the
//! calorimeter volume is split into cubic cells no smaller than the search
//! radius, so every candidate neighbor lives in the 3x3x3 block around a
//! crystal's own cell.

use std::collections::HashMap;

use nalgebra::Vector3;

/// Integer cell coordinates.
pub type CellKey = (i64, i64, i64);

/// Largest cell coordinate magnitude; keeps `coord ± 1` inside `i64`.
const MAX_CELL: f64 = 4_611_686_018_427_387_904.0;

/// Uniform 3D grid of cubic cells.
#[derive(Debug, Default)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<T>>,
}

impl<T: Copy> SpatialGrid<T> {
    /// Create a new spatial grid. `cell_size` must be positive.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Cell holding `position`, or `None` if the position is non-finite or
    /// too far from the origin for the grid.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn cell_of(&self, position: &Vector3<f64>) -> Option<CellKey> {
        let axis = |c: f64| {
            let cell = (c / self.cell_size).floor();
            (cell.abs() <= MAX_CELL).then_some(cell as i64)
        };
        Some((axis(position.x)?, axis(position.y)?, axis(position.z)?))
    }

    /// Insert a value at the given position. Returns false, leaving the grid
    /// unchanged, if the position has no cell.
    pub fn insert(&mut self, position: &Vector3<f64>, value: T) -> bool {
        let Some(cell) = self.cell_of(position) else {
            return false;
        };
        self.cells.entry(cell).or_default().push(value);
        true
    }

    /// Query the 3x3x3 cell block around a position.
    pub fn query_neighborhood(&self, position: &Vector3<f64>) -> Vec<T> {
        let mut result = Vec::new();
        let Some((cx, cy, cz)) = self.cell_of(position) else {
            return result;
        };

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(values) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        result.extend(values.iter().copied());
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid() {
        let mut grid: SpatialGrid<usize> = SpatialGrid::new(35.0);
        grid.insert(&Vector3::new(100.0, 100.0, 0.0), 0);
        grid.insert(&Vector3::new(134.0, 100.0, 0.0), 1);
        grid.insert(&Vector3::new(300.0, 300.0, 0.0), 2);
        grid.insert(&Vector3::new(-20.0, 100.0, 0.0), 3);

        let neighbors = grid.query_neighborhood(&Vector3::new(100.0, 100.0, 0.0));
        assert!(neighbors.contains(&0));
        assert!(neighbors.contains(&1));
        assert!(!neighbors.contains(&2));
        assert!(!neighbors.contains(&3));
    }

    #[test]
    fn test_positions_without_cell() {
        let mut grid: SpatialGrid<usize> = SpatialGrid::new(1.0);
        assert!(!grid.insert(&Vector3::new(1e300, 0.0, 0.0), 0));
        assert!(!grid.insert(&Vector3::new(0.0, f64::NAN, 0.0), 1));
        assert!(grid.insert(&Vector3::new(-1e15, 0.0, 0.0), 2));
        assert!(grid.query_neighborhood(&Vector3::new(0.0, 0.0, -1e300)).is_empty());
        assert_eq!(grid.query_neighborhood(&Vector3::new(-1e15, 0.5, 0.0)), vec![2]);
    }
}
