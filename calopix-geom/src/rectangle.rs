//! Rectangular planar patches.

use std::fmt;

use log::warn;
use nalgebra::{Unit, Vector3};

use crate::error::{ensure_half_length, Result};
use crate::plane::{rescaled, Plane, Surface};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis hint whose in-plane component is shorter than this fraction of
/// its length is treated as parallel to the normal.
const AXIS_TOLERANCE: f64 = 1e-8;

/// Removes the normal component of `hint` and normalizes the rest.
fn in_plane_axis(normal: &Unit<Vector3<f64>>, hint: &Vector3<f64>) -> Option<Unit<Vector3<f64>>> {
    let hint = rescaled(hint)?;
    let projected = hint - normal.into_inner() * normal.dot(&hint);
    Unit::try_new(projected, AXIS_TOLERANCE * hint.norm())
}

/// Picks the U axis: the hint if usable, otherwise global X, then global Y.
///
/// X and Y cannot both be parallel to a unit normal, so this always
/// succeeds.
fn choose_u_axis(normal: &Unit<Vector3<f64>>, hint: &Vector3<f64>) -> Unit<Vector3<f64>> {
    if let Some(u) = in_plane_axis(normal, hint) {
        return u;
    }
    warn!("U axis hint {hint:?} is parallel to normal {normal:?}; falling back to a global axis");
    in_plane_axis(normal, &Vector3::x())
        .or_else(|| in_plane_axis(normal, &Vector3::y()))
        .unwrap_or_else(Vector3::y_axis)
}

/// A bounded rectangle on an oriented plane.
///
/// The U and V directions are unit vectors, orthogonal to each other and
/// to the normal, with `v = normal × u`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rectangle {
    plane: Plane,
    udir: Unit<Vector3<f64>>,
    vdir: Unit<Vector3<f64>>,
    uhalflen: f64,
    vhalflen: f64,
}

impl Rectangle {
    /// Creates a rectangle.
    ///
    /// `u_axis` only needs a non-zero component in the plane; its normal
    /// component is discarded. A hint parallel to the normal falls back to
    /// global X, then global Y.
    ///
    /// # Errors
    /// Fails for a zero normal or a negative or non-finite half length.
    pub fn new(
        normal: Vector3<f64>,
        center: Vector3<f64>,
        u_axis: Vector3<f64>,
        u_half_length: f64,
        v_half_length: f64,
    ) -> Result<Self> {
        ensure_half_length("u half-length", u_half_length)?;
        ensure_half_length("v half-length", v_half_length)?;
        let plane = Plane::new(normal, center)?;
        let udir = choose_u_axis(plane.normal(), &u_axis);
        let vdir = Unit::new_normalize(plane.normal().cross(&udir.into_inner()));
        Ok(Self {
            plane,
            udir,
            vdir,
            uhalflen: u_half_length,
            vhalflen: v_half_length,
        })
    }

    /// Creates a rectangle whose U axis is derived from global Z as the
    /// reference "up" direction (with the same fallback chain).
    ///
    /// # Errors
    /// Same as [`Rectangle::new`].
    pub fn with_default_axes(
        normal: Vector3<f64>,
        center: Vector3<f64>,
        u_half_length: f64,
        v_half_length: f64,
    ) -> Result<Self> {
        Self::new(normal, center, Vector3::z(), u_half_length, v_half_length)
    }

    /// Bound test on precomputed local coordinates. Edges are excluded.
    #[must_use]
    pub fn on_rectangle(&self, udist: f64, vdist: f64) -> bool {
        udist.abs() < self.uhalflen && vdist.abs() < self.vhalflen
    }

    /// Local (u, v) coordinates of the projection of `point`.
    #[must_use]
    pub fn local_coordinates(&self, point: &Vector3<f64>) -> (f64, f64) {
        let offset = point - self.plane.center();
        (offset.dot(&self.udir.into_inner()), offset.dot(&self.vdir.into_inner()))
    }

    /// The underlying infinite plane.
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// U direction: perpendicular to the normal.
    #[must_use]
    pub fn u_direction(&self) -> &Unit<Vector3<f64>> {
        &self.udir
    }

    /// V direction: perpendicular to the normal and to U.
    #[must_use]
    pub fn v_direction(&self) -> &Unit<Vector3<f64>> {
        &self.vdir
    }

    /// Half length along U.
    #[must_use]
    pub fn u_half_length(&self) -> f64 {
        self.uhalflen
    }

    /// Half length along V.
    #[must_use]
    pub fn v_half_length(&self) -> f64 {
        self.vhalflen
    }
}

impl Surface for Rectangle {
    fn normal(&self) -> &Unit<Vector3<f64>> {
        self.plane.normal()
    }

    fn center(&self) -> &Vector3<f64> {
        self.plane.center()
    }

    fn in_bounds(&self, point: &Vector3<f64>, tol: f64) -> bool {
        if !self.on_plane(point, tol) {
            return false;
        }
        let (u, v) = self.local_coordinates(point);
        self.on_rectangle(u, v)
    }
}

pub(crate) struct Triple<'a>(pub &'a Vector3<f64>);

impl fmt::Display for Triple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rectangle with center {}, normal {}, U direction {}, U half-length {}, V half-length {}",
            Triple(self.center()),
            Triple(self.normal()),
            Triple(&self.udir),
            self.uhalflen,
            self.vhalflen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Rectangle {
        Rectangle::new(
            Vector3::z(),
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::x(),
            1.0,
            1.0,
        )
        .unwrap()
    }

    fn assert_orthonormal(rect: &Rectangle) {
        let n = rect.normal().into_inner();
        let u = rect.u_direction().into_inner();
        let v = rect.v_direction().into_inner();
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.dot(&n), 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.dot(&n), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axes_from_hint() {
        let rect = Rectangle::new(
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::zeros(),
            Vector3::new(2.0, 0.0, 5.0),
            2.0,
            1.0,
        )
        .unwrap();
        assert_relative_eq!(rect.u_direction().into_inner(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(rect.v_direction().into_inner(), Vector3::y(), epsilon = 1e-12);
        assert_orthonormal(&rect);
    }

    #[test]
    fn test_degenerate_hint_falls_back() {
        let rect =
            Rectangle::new(Vector3::z(), Vector3::zeros(), Vector3::new(0.0, 0.0, -4.0), 1.0, 1.0)
                .unwrap();
        assert_relative_eq!(rect.u_direction().into_inner(), Vector3::x(), epsilon = 1e-12);
        assert_orthonormal(&rect);

        let rect = Rectangle::new(Vector3::x(), Vector3::zeros(), Vector3::x(), 1.0, 1.0).unwrap();
        assert_relative_eq!(rect.u_direction().into_inner(), Vector3::y(), epsilon = 1e-12);
        assert_orthonormal(&rect);

        let rect = Rectangle::new(Vector3::z(), Vector3::zeros(), Vector3::zeros(), 1.0, 1.0).unwrap();
        assert_orthonormal(&rect);
    }

    #[test]
    fn test_default_axes() {
        let rect = Rectangle::with_default_axes(Vector3::new(1.0, 1.0, 0.0), Vector3::zeros(), 1.0, 2.0)
            .unwrap();
        assert_relative_eq!(rect.u_direction().into_inner(), Vector3::z(), epsilon = 1e-12);
        assert_orthonormal(&rect);

        let rect = Rectangle::with_default_axes(Vector3::z(), Vector3::zeros(), 1.0, 2.0).unwrap();
        assert_relative_eq!(rect.u_direction().into_inner(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_extreme_magnitude_normal_and_hint() {
        for (normal_scale, hint_scale) in [(1e200, 1e250), (1e-200, 1e-250), (1e200, 1e-200)] {
            let rect = Rectangle::new(
                Vector3::new(normal_scale, 0.0, 0.0),
                Vector3::new(1.0, 2.0, 3.0),
                Vector3::new(0.0, hint_scale, 0.0),
                1.0,
                1.0,
            )
            .unwrap();
            assert_relative_eq!(rect.normal().into_inner(), Vector3::x(), epsilon = 1e-12);
            assert_relative_eq!(rect.u_direction().into_inner(), Vector3::y(), epsilon = 1e-12);
            assert_orthonormal(&rect);
            assert!(rect.in_bounds(rect.center(), 0.0));
        }
    }

    #[test]
    fn test_center_is_in_bounds() {
        let rect = unit_square();
        assert!(rect.in_bounds(rect.center(), 0.0));
        assert!(rect.in_bounds(rect.center(), 1e-8));
    }

    #[test]
    fn test_boundary_excluded() {
        let rect = unit_square();
        assert!(!rect.in_bounds(&Vector3::new(1.0, 0.0, 10.0), 1e-8));
        assert!(!rect.in_bounds(&Vector3::new(0.0, -1.0, 10.0), 1e-8));
        assert!(rect.in_bounds(&Vector3::new(0.999, -0.999, 10.0), 1e-8));
        assert!(!rect.on_rectangle(1.0, 0.0));
        assert!(rect.on_rectangle(-0.5, 0.5));
    }

    #[test]
    fn test_out_of_plane_rejected() {
        let rect = unit_square();
        assert!(!rect.in_bounds(&Vector3::new(0.0, 0.0, 10.1), 1e-8));
        assert!(rect.in_bounds(&Vector3::new(0.0, 0.0, 10.1), 0.2));
    }

    #[test]
    fn test_local_coordinates() {
        let rect = Rectangle::new(
            Vector3::x(),
            Vector3::new(5.0, 1.0, 1.0),
            Vector3::y(),
            3.0,
            3.0,
        )
        .unwrap();
        let (u, v) = rect.local_coordinates(&Vector3::new(7.0, 3.0, -1.0));
        assert_relative_eq!(u, 2.0, epsilon = 1e-12);
        assert_relative_eq!(v, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_negative_half_length() {
        assert!(Rectangle::new(Vector3::z(), Vector3::zeros(), Vector3::x(), -1.0, 1.0).is_err());
        assert!(Rectangle::new(Vector3::z(), Vector3::zeros(), Vector3::x(), 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_display() {
        let text = unit_square().to_string();
        assert!(text.starts_with("Rectangle with center (0, 0, 10)"));
        assert!(text.contains("U half-length 1"));
    }
}
