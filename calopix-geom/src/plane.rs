//! Oriented planes and the surface interface shared by planar patches.

use nalgebra::{Unit, Vector3};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default out-of-plane tolerance for containment tests (mm).
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Below this |n·d| a ray is treated as parallel to a plane.
const PARALLEL_TOLERANCE: f64 = 1e-12;

/// Divides `v` by its largest absolute component so that squaring the
/// components neither overflows nor underflows. `None` for zero or
/// non-finite vectors.
pub(crate) fn rescaled(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    let scale = v.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    (scale > 0.0).then(|| v / scale)
}

/// Normalizes `v`, rejecting zero and non-finite vectors.
pub(crate) fn unit(name: &'static str, v: Vector3<f64>) -> Result<Unit<Vector3<f64>>> {
    rescaled(&v)
        .and_then(|scaled| Unit::try_new(scaled, f64::MIN_POSITIVE))
        .filter(|u| u.iter().all(|c| c.is_finite()) && (u.norm() - 1.0).abs() < 1e-12)
        .ok_or(Error::ZeroVector(name))
}

/// A half-line used for surface intersections.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Starting point.
    pub origin: Vector3<f64>,
    /// Unit propagation direction.
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    /// Creates a ray; `direction` is normalized.
    ///
    /// # Errors
    /// Returns [`Error::ZeroVector`] for a zero direction.
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Result<Self> {
        Ok(Self {
            origin,
            direction: unit("ray direction", direction)?,
        })
    }

    /// Point at path length `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Result of intersecting a ray with a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Signed path length from the ray origin; negative means behind it.
    pub distance: f64,
    /// Intersection point on the infinite plane.
    pub point: Vector3<f64>,
    /// Whether the point lies within the surface bounds.
    pub in_bounds: bool,
}

/// A planar surface with an optional bounded region.
pub trait Surface: Send + Sync {
    /// Unit normal.
    fn normal(&self) -> &Unit<Vector3<f64>>;

    /// Reference point on the plane.
    fn center(&self) -> &Vector3<f64>;

    /// Returns true if `point` lies on the surface within `tol` and inside
    /// its bounds.
    fn in_bounds(&self, point: &Vector3<f64>, tol: f64) -> bool;

    /// [`Surface::in_bounds`] with [`DEFAULT_TOLERANCE`].
    fn contains(&self, point: &Vector3<f64>) -> bool {
        self.in_bounds(point, DEFAULT_TOLERANCE)
    }

    /// Signed distance from the plane along the normal.
    fn distance(&self, point: &Vector3<f64>) -> f64 {
        (point - self.center()).dot(&self.normal().into_inner())
    }

    /// Returns true if the out-of-plane residual is at most `tol`.
    fn on_plane(&self, point: &Vector3<f64>, tol: f64) -> bool {
        self.distance(point).abs() <= tol
    }

    /// Closest point on the infinite plane.
    fn project(&self, point: &Vector3<f64>) -> Vector3<f64> {
        point - self.normal().into_inner() * self.distance(point)
    }

    /// Intersects `ray` with the infinite plane and reports whether the hit
    /// point is in bounds. Returns `None` for rays parallel to the plane.
    fn intersect(&self, ray: &Ray, tol: f64) -> Option<Intersection> {
        let denom = self.normal().dot(&ray.direction.into_inner());
        if denom.abs() < PARALLEL_TOLERANCE {
            return None;
        }
        let distance = (self.center() - ray.origin).dot(&self.normal().into_inner()) / denom;
        let point = ray.at(distance);
        Some(Intersection {
            distance,
            point,
            in_bounds: self.in_bounds(&point, tol),
        })
    }
}

/// Infinite oriented plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    normal: Unit<Vector3<f64>>,
    center: Vector3<f64>,
}

impl Plane {
    /// Creates a plane through `center`; `normal` is normalized.
    ///
    /// # Errors
    /// Returns [`Error::ZeroVector`] for a zero normal.
    pub fn new(normal: Vector3<f64>, center: Vector3<f64>) -> Result<Self> {
        Ok(Self {
            normal: unit("plane normal", normal)?,
            center,
        })
    }
}

impl Surface for Plane {
    fn normal(&self) -> &Unit<Vector3<f64>> {
        &self.normal
    }

    fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    fn in_bounds(&self, point: &Vector3<f64>, tol: f64) -> bool {
        self.on_plane(point, tol)
    }
}
