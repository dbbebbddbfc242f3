//! Annular planar patches, such as the front face of a calorimeter disk.

use std::fmt;

use nalgebra::{Unit, Vector3};

use crate::error::{ensure_half_length, Error, Result};
use crate::plane::{Plane, Surface};
use crate::rectangle::Triple;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A flat ring `inner <= r < outer` around the center of a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Annulus {
    plane: Plane,
    inner: f64,
    outer: f64,
}

impl Annulus {
    /// Creates an annulus. An inner radius of zero gives a disk.
    ///
    /// # Errors
    /// Fails for a zero normal, negative radii, or `inner > outer`.
    pub fn new(
        normal: Vector3<f64>,
        center: Vector3<f64>,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<Self> {
        ensure_half_length("inner radius", inner_radius)?;
        ensure_half_length("outer radius", outer_radius)?;
        if inner_radius > outer_radius {
            return Err(Error::InvalidConfiguration(format!(
                "inner radius {inner_radius} exceeds outer radius {outer_radius}"
            )));
        }
        Ok(Self {
            plane: Plane::new(normal, center)?,
            inner: inner_radius,
            outer: outer_radius,
        })
    }

    /// In-plane distance of the projection of `point` from the center.
    #[must_use]
    pub fn radius_of(&self, point: &Vector3<f64>) -> f64 {
        (self.project(point) - self.center()).norm()
    }

    /// Bound test on a precomputed in-plane radius.
    #[must_use]
    pub fn on_annulus(&self, radius: f64) -> bool {
        radius >= self.inner && radius < self.outer
    }

    /// Inner radius (inclusive).
    #[must_use]
    pub fn inner_radius(&self) -> f64 {
        self.inner
    }

    /// Outer radius (exclusive).
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.outer
    }
}

impl Surface for Annulus {
    fn normal(&self) -> &Unit<Vector3<f64>> {
        self.plane.normal()
    }

    fn center(&self) -> &Vector3<f64> {
        self.plane.center()
    }

    fn in_bounds(&self, point: &Vector3<f64>, tol: f64) -> bool {
        self.on_plane(point, tol) && self.on_annulus(self.radius_of(point))
    }
}

impl fmt::Display for Annulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Annulus with center {}, normal {}, inner radius {}, outer radius {}",
            Triple(self.center()),
            Triple(self.normal()),
            self.inner,
            self.outer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disk_face() -> Annulus {
        Annulus::new(Vector3::z(), Vector3::new(0.0, 0.0, 1194.0), 374.0, 660.0).unwrap()
    }

    #[test]
    fn test_radial_bounds() {
        let face = disk_face();
        assert!(face.contains(&Vector3::new(500.0, 0.0, 1194.0)));
        assert!(face.contains(&Vector3::new(0.0, 374.0, 1194.0)));
        assert!(!face.contains(&Vector3::new(0.0, 660.0, 1194.0)));
        assert!(!face.contains(&Vector3::new(100.0, 100.0, 1194.0)));
        assert!(!face.contains(&Vector3::new(500.0, 0.0, 1200.0)));
    }

    #[test]
    fn test_radius_of_ignores_normal_offset() {
        let face = disk_face();
        assert_relative_eq!(face.radius_of(&Vector3::new(300.0, 400.0, 0.0)), 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_inverted_radii() {
        assert!(Annulus::new(Vector3::z(), Vector3::zeros(), 2.0, 1.0).is_err());
        assert!(Annulus::new(Vector3::z(), Vector3::zeros(), -1.0, 1.0).is_err());
        assert!(Annulus::new(Vector3::z(), Vector3::zeros(), 0.0, 1.0).is_ok());
    }
}
