//! Optical model of the chamber.
//!
//! Two cameras image a thick chamber bounded by two glass planes. The
//! apparent scale of an object depends on its depth, which is modelled as a
//! linear magnification law `M(z) = a + b * z` with `z = 0` at the front glass
//! and `z = CHAMBER_DEPTH` at the rear glass. The law is calibrated from two
//! fiducials on each plane.
//!
//! Depth is recovered from the stereoshift: the apparent displacement of a
//! point between two views, relative to the displacement of a fiducial on a
//! known plane, equals the fractional depth of the point between the planes.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::fiducial::{CHAMBER_DEPTH, Fiducial, FiducialPlane};
use crate::{GeometryError, Pt2, Real, length};

/// Plane whose apparent motion between views is subtracted from every other
/// shift, so that it appears stationary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePlane {
    #[default]
    Front,
    Back,
}

impl ReferencePlane {
    /// The plane whose fiducial provides the stereoshift denominator.
    pub fn opposite(self) -> FiducialPlane {
        match self {
            ReferencePlane::Front => FiducialPlane::Back,
            ReferencePlane::Back => FiducialPlane::Front,
        }
    }

    /// Glass plane acting as the reference.
    pub fn plane(self) -> FiducialPlane {
        match self {
            ReferencePlane::Front => FiducialPlane::Front,
            ReferencePlane::Back => FiducialPlane::Back,
        }
    }
}

impl std::fmt::Display for ReferencePlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.plane())
    }
}

impl std::str::FromStr for ReferencePlane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(ReferencePlane::Front),
            "back" | "rear" => Ok(ReferencePlane::Back),
            other => Err(format!("unknown reference plane {other:?}")),
        }
    }
}

/// A catalogued fiducial together with its observed pixel position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedFiducial {
    pub fiducial: Fiducial,
    pub observed: Pt2,
}

impl ObservedFiducial {
    pub fn new(fiducial: Fiducial, observed: Pt2) -> Self {
        Self { fiducial, observed }
    }

    /// Pair the catalogue entry called `name` with an observed position.
    pub fn named(name: &str, observed: Pt2) -> Result<Self, GeometryError> {
        Ok(Self::new(Fiducial::lookup(name)?, observed))
    }
}

/// Linear magnification law `M(z) = a + b * z` (centimetres per pixel).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Magnification {
    /// Scale at the front glass (`z = 0`).
    pub a: Real,
    /// Scale change per centimetre of depth.
    pub b: Real,
}

impl Magnification {
    pub fn new(a: Real, b: Real) -> Self {
        Self { a, b }
    }

    /// Evaluate the law at depth `z` (centimetres from the front glass).
    #[inline]
    pub fn at(&self, z: Real) -> Real {
        self.a + self.b * z
    }
}

/// Calibrate the magnification law from two front and two rear fiducials.
///
/// With `T` the nominal separation of a pair and `P` its observed separation,
/// `a = T_f / P_f` and `b = (T_b / P_b - a) / CHAMBER_DEPTH`.
///
/// # Errors
///
/// - [`GeometryError::WrongPlane`] if `f1`/`f2` are not front marks or
///   `b1`/`b2` are not rear marks.
/// - [`GeometryError::CoincidentFiducials`] if a pair is observed at a single
///   position.
pub fn magnification(
    f1: &ObservedFiducial,
    f2: &ObservedFiducial,
    b1: &ObservedFiducial,
    b2: &ObservedFiducial,
) -> Result<Magnification, GeometryError> {
    for (obs, plane) in [
        (f1, FiducialPlane::Front),
        (f2, FiducialPlane::Front),
        (b1, FiducialPlane::Back),
        (b2, FiducialPlane::Back),
    ] {
        if obs.fiducial.plane != plane {
            return Err(GeometryError::WrongPlane {
                name: obs.fiducial.name.to_string(),
                expected: plane,
                actual: obs.fiducial.plane,
            });
        }
    }

    let front_scale = plane_scale(f1, f2)?;
    let back_scale = plane_scale(b1, b2)?;

    let a = front_scale;
    let b = (back_scale - a) / CHAMBER_DEPTH;
    debug!(
        "magnification from {}/{} and {}/{}: a = {a}, b = {b}",
        f1.fiducial.name, f2.fiducial.name, b1.fiducial.name, b2.fiducial.name
    );
    Ok(Magnification { a, b })
}

fn plane_scale(p: &ObservedFiducial, q: &ObservedFiducial) -> Result<Real, GeometryError> {
    let nominal = length(p.fiducial.position(), q.fiducial.position());
    let observed = length(p.observed, q.observed);
    if observed == 0.0 {
        return Err(GeometryError::CoincidentFiducials(
            p.fiducial.name.to_string(),
            q.fiducial.name.to_string(),
        ));
    }
    Ok(nominal / observed)
}

/// Ratio of the point shift to the fiducial shift between two views.
///
/// `f_a`/`f_b` are the reference fiducial in view A and B, `p_a`/`p_b` the
/// point of interest.
///
/// # Errors
///
/// [`GeometryError::ZeroFiducialShift`] if the fiducial did not move.
pub fn stereoshift(f_a: Pt2, f_b: Pt2, p_a: Pt2, p_b: Pt2) -> Result<Real, GeometryError> {
    let fiducial_shift = length(f_a, f_b);
    if fiducial_shift == 0.0 {
        return Err(GeometryError::ZeroFiducialShift);
    }
    Ok(length(p_a, p_b) / fiducial_shift)
}

/// Depth of a point (centimetres from the front glass) from its stereoshift.
///
/// With the front plane as reference the shifts are measured relative to the
/// front glass and `depth = s * CHAMBER_DEPTH`; with the rear plane as
/// reference `depth = (1 - s) * CHAMBER_DEPTH`.
pub fn depth(
    f_a: Pt2,
    f_b: Pt2,
    p_a: Pt2,
    p_b: Pt2,
    reference: ReferencePlane,
) -> Result<Real, GeometryError> {
    let s = stereoshift(f_a, f_b, p_a, p_b)?;
    Ok(depth_from_stereoshift(s, reference))
}

/// Depth for an already computed stereoshift ratio.
#[inline]
pub fn depth_from_stereoshift(s: Real, reference: ReferencePlane) -> Real {
    match reference {
        ReferencePlane::Front => s * CHAMBER_DEPTH,
        ReferencePlane::Back => (1.0 - s) * CHAMBER_DEPTH,
    }
}

/// A pair of points with the reference offsets removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectedShift {
    /// `points[i] - offsets[i]`.
    pub points: [Pt2; 2],
    /// Distance between the adjusted points.
    pub shift: Real,
}

/// Shift between two views after subtracting the reference position in each
/// view.
///
/// `offsets[i]` is the position of the reference mark in the view of
/// `points[i]`. The inputs are left untouched; the adjusted pair is returned.
pub fn corrected_shift(points: [Pt2; 2], offsets: [Pt2; 2]) -> CorrectedShift {
    let adjusted = [
        Pt2::from(points[0] - offsets[0]),
        Pt2::from(points[1] - offsets[1]),
    ];
    CorrectedShift {
        shift: length(adjusted[0], adjusted[1]),
        points: adjusted,
    }
}
