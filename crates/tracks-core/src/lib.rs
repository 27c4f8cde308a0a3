//! Core math and geometry primitives for `particle-tracks`.
//!
//! This crate provides the building blocks used by the measurement session:
//!
//! - linear algebra type aliases (`Real`, `Pt2`, `Vec2`, `Mat3`),
//! - planar geometry (distances, circles through three points, opening angles,
//!   track slopes),
//! - the fiducial catalogue of the chamber's front and rear glass planes,
//! - the optical model of the chamber: depth-dependent magnification,
//!   stereoshift and depth inversion.
//!
//! Optical model (conceptually):
//! `length_cm = M(z) * length_px`, with `M(z) = a + b * z` and `z = 0` at the
//! front glass.
//!
//! # Example
//!
//! ```
//! use tracks_core::{Pt2, radius};
//!
//! let r = radius(Pt2::new(0.0, 1.0), Pt2::new(1.0, 0.0), Pt2::new(0.0, -1.0)).unwrap();
//! assert!((r - 1.0).abs() < 1e-12);
//! ```

/// Error type shared by the geometry and optics functions.
mod error;
/// Fiducial marks engraved on the chamber glass.
pub mod fiducial;
/// Planar geometry primitives over pixel coordinates.
mod geometry;
/// Linear algebra type aliases.
mod math;
/// Magnification, stereoshift and depth.
pub mod optics;

pub use error::*;
pub use fiducial::{BACK_FIDUCIALS, CHAMBER_DEPTH, FRONT_FIDUCIALS, Fiducial, FiducialPlane};
pub use geometry::*;
pub use math::*;
pub use optics::{
    CorrectedShift, Magnification, ObservedFiducial, ReferencePlane, corrected_shift, depth,
    depth_from_stereoshift, magnification, stereoshift,
};
