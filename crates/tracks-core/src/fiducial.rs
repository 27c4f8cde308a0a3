//! Fiducial catalogue of the bubble chamber.
//!
//! The chamber has two glass planes, each engraved with lettered marks at
//! known positions. Coordinates are in centimetres relative to the chamber
//! axis; the front plane sits at `z = 0` and the rear plane at
//! `z = CHAMBER_DEPTH`.

use serde::{Deserialize, Serialize};

use crate::{GeometryError, Pt2, Real};

/// Distance between the front and rear glass planes, in centimetres.
pub const CHAMBER_DEPTH: Real = 31.6;

/// Glass plane a fiducial is engraved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiducialPlane {
    Front,
    Back,
}

impl FiducialPlane {
    /// Depth of the plane measured from the front glass.
    pub fn z(self) -> Real {
        match self {
            FiducialPlane::Front => 0.0,
            FiducialPlane::Back => CHAMBER_DEPTH,
        }
    }

    /// Catalogue of marks engraved on this plane.
    pub fn catalogue(self) -> &'static [Fiducial] {
        match self {
            FiducialPlane::Front => &FRONT_FIDUCIALS,
            FiducialPlane::Back => &BACK_FIDUCIALS,
        }
    }
}

impl std::fmt::Display for FiducialPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FiducialPlane::Front => write!(f, "front"),
            FiducialPlane::Back => write!(f, "back"),
        }
    }
}

/// A catalogued fiducial mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fiducial {
    /// Canonical name; front marks carry an ASCII prime (`C'`).
    pub name: &'static str,
    pub plane: FiducialPlane,
    /// Nominal x position in centimetres.
    pub x: Real,
    /// Nominal y position in centimetres.
    pub y: Real,
}

impl Fiducial {
    const fn new(name: &'static str, plane: FiducialPlane, x: Real, y: Real) -> Self {
        Self { name, plane, x, y }
    }

    /// Nominal planar position in centimetres.
    #[inline]
    pub fn position(&self) -> Pt2 {
        Pt2::new(self.x, self.y)
    }

    /// Look up a mark by name on either plane.
    ///
    /// The prime of front-plane marks may be written as `'`, `′` or `’`.
    ///
    /// # Errors
    ///
    /// [`GeometryError::UnknownFiducial`] if no mark carries that name.
    pub fn lookup(name: &str) -> Result<Fiducial, GeometryError> {
        let key = canonical_name(name);
        FRONT_FIDUCIALS
            .iter()
            .chain(BACK_FIDUCIALS.iter())
            .find(|f| f.name == key)
            .copied()
            .ok_or_else(|| GeometryError::UnknownFiducial(name.to_string()))
    }

    /// Look up a mark by name and require it to lie on `plane`.
    pub fn lookup_on(name: &str, plane: FiducialPlane) -> Result<Fiducial, GeometryError> {
        let fiducial = Self::lookup(name)?;
        if fiducial.plane != plane {
            return Err(GeometryError::WrongPlane {
                name: fiducial.name.to_string(),
                expected: plane,
                actual: fiducial.plane,
            });
        }
        Ok(fiducial)
    }
}

fn canonical_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '\u{2032}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Marks on the front glass (`z = 0`).
pub const FRONT_FIDUCIALS: [Fiducial; 4] = [
    Fiducial::new("C'", FiducialPlane::Front, 0.0, 0.0),
    Fiducial::new("F'", FiducialPlane::Front, 14.97, -8.67),
    Fiducial::new("B'", FiducialPlane::Front, 15.00, 8.66),
    Fiducial::new("D'", FiducialPlane::Front, 29.91, -0.07),
];

/// Marks on the rear glass (`z = CHAMBER_DEPTH`).
pub const BACK_FIDUCIALS: [Fiducial; 6] = [
    Fiducial::new("C", FiducialPlane::Back, -0.02, 0.01),
    Fiducial::new("F", FiducialPlane::Back, 14.95, -8.63),
    Fiducial::new("B", FiducialPlane::Back, 14.92, 8.67),
    Fiducial::new("D", FiducialPlane::Back, 29.90, 0.02),
    Fiducial::new("E", FiducialPlane::Back, -14.96, -8.62),
    Fiducial::new("A", FiducialPlane::Back, -15.00, 8.68),
];
