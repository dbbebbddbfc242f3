//! calopix-geom: Planar reconstruction surfaces.
//!
//! Oriented planes with optional bounded regions, used to express detector
//! and fiducial boundaries:
//! - [`Plane`] - unbounded
//! - [`Rectangle`] - bounded by half lengths along two in-plane axes
//! - [`Annulus`] - bounded by inner and outer radii
//!
//! Surfaces are immutable after construction and safe to share across
//! threads.
//!

mod annulus;
pub mod error;
mod plane;
mod rectangle;

pub use annulus::Annulus;
pub use error::{Error, Result};
pub use plane::{Intersection, Plane, Ray, Surface, DEFAULT_TOLERANCE};
pub use rectangle::Rectangle;

pub use nalgebra::Vector3;
