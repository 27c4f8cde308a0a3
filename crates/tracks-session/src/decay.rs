//! Per-candidate decay records.
//!
//! A [`DecayRecord`] stores raw pixel measurements and the quantities derived
//! from them in pixel space. Physical values (centimetres) are never stored;
//! they are computed on read from the record's calibration and the depth of
//! the origin vertex.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};
use tracks_core::{
    CHAMBER_DEPTH, GeometryError, Magnification, Pt2, Real, ReferencePlane, corrected_shift,
    depth_from_stereoshift, length, radius,
};

use crate::error::SessionError;

/// Decay hypotheses offered to the student, indexed as in the selection menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecayKind {
    /// Σ⁺ → p + π⁰
    SigmaPlusToProtonPiZero,
    /// Σ⁺ → n + π⁺
    SigmaPlusToNeutronPiPlus,
    /// Σ⁻ → n + π⁻
    SigmaMinusToNeutronPiMinus,
    /// Λ⁰ → p + π⁻
    LambdaToProtonPiMinus,
    /// Λ⁰ → n + π⁰
    LambdaToNeutronPiZero,
}

impl DecayKind {
    pub const ALL: [DecayKind; 5] = [
        DecayKind::SigmaPlusToProtonPiZero,
        DecayKind::SigmaPlusToNeutronPiPlus,
        DecayKind::SigmaMinusToNeutronPiMinus,
        DecayKind::LambdaToProtonPiMinus,
        DecayKind::LambdaToNeutronPiZero,
    ];

    /// Menu position, starting at 1.
    pub fn index(self) -> u8 {
        match self {
            DecayKind::SigmaPlusToProtonPiZero => 1,
            DecayKind::SigmaPlusToNeutronPiPlus => 2,
            DecayKind::SigmaMinusToNeutronPiMinus => 3,
            DecayKind::LambdaToProtonPiMinus => 4,
            DecayKind::LambdaToNeutronPiZero => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.index() == index)
    }

    /// Human readable label, used as the default record name.
    pub fn label(self) -> &'static str {
        match self {
            DecayKind::SigmaPlusToProtonPiZero => "Σ⁺ ⇨ p + π⁰",
            DecayKind::SigmaPlusToNeutronPiPlus => "Σ⁺ ⇨ n + π⁺",
            DecayKind::SigmaMinusToNeutronPiMinus => "Σ⁻ ⇨ n + π⁻",
            DecayKind::LambdaToProtonPiMinus => "Λ⁰ ⇨ p + π⁻",
            DecayKind::LambdaToNeutronPiZero => "Λ⁰ ⇨ n + π⁰",
        }
    }

    /// Whether the decay has a charged track whose curvature is measured.
    pub fn has_radius(self) -> bool {
        self.index() <= 4
    }

    /// Decay length is measured for every hypothesis.
    pub fn has_decay_length(self) -> bool {
        true
    }

    /// Only Λ⁰ → p + π⁻ has two visible daughters to measure angles between.
    pub fn has_opening_angles(self) -> bool {
        self == DecayKind::LambdaToProtonPiMinus
    }
}

impl std::fmt::Display for DecayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Locator of a displayed image: which camera and which photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    pub view: u32,
    pub event: u32,
}

impl Slice {
    pub fn new(view: u32, event: u32) -> Self {
        Self { view, event }
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view {} event {}", self.view, self.event)
    }
}

/// A point picked by the student, tagged with the slice it was picked on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlicePoint {
    pub point: Pt2,
    pub slice: Slice,
}

impl SlicePoint {
    pub fn new(x: Real, y: Real, slice: Slice) -> Self {
        Self {
            point: Pt2::new(x, y),
            slice,
        }
    }
}

/// Which vertex of the decay a stereoshift measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vertex {
    /// Production vertex of the parent.
    Origin,
    /// Point where the parent decays.
    Decay,
}

/// Depth of a point from its apparent motion between two views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoshiftMeasurement {
    /// Reference fiducial in the first view.
    pub sf1: Pt2,
    /// Reference fiducial in the second view.
    pub sf2: Pt2,
    /// Point of interest in the first view.
    pub sp1: Pt2,
    /// Point of interest in the second view.
    pub sp2: Pt2,
    pub shift_fiducial: Real,
    pub shift_point: Real,
    pub stereoshift: Real,
    pub depth_cm: Real,
    pub plane: ReferencePlane,
}

impl StereoshiftMeasurement {
    /// Measure the stereoshift of `point` against `fiducial`.
    ///
    /// `offsets` is the position of a mark on the reference plane in each of
    /// the two views; it is subtracted from both pairs before the shifts are
    /// taken. The raw picks are stored, the shifts are reference corrected.
    ///
    /// # Errors
    ///
    /// [`GeometryError::ZeroFiducialShift`] if the corrected fiducial shift
    /// vanishes.
    pub fn measure(
        fiducial: [Pt2; 2],
        point: [Pt2; 2],
        offsets: [Pt2; 2],
        plane: ReferencePlane,
    ) -> Result<Self, GeometryError> {
        let shift_fiducial = corrected_shift(fiducial, offsets).shift;
        let shift_point = corrected_shift(point, offsets).shift;
        if shift_fiducial == 0.0 {
            return Err(GeometryError::ZeroFiducialShift);
        }
        let stereoshift = shift_point / shift_fiducial;
        let depth_cm = depth_from_stereoshift(stereoshift, plane);
        debug!("stereoshift {stereoshift} ({plane} reference) -> depth {depth_cm} cm");
        Ok(Self {
            sf1: fiducial[0],
            sf2: fiducial[1],
            sp1: point[0],
            sp2: point[1],
            shift_fiducial,
            shift_point,
            stereoshift,
            depth_cm,
            plane,
        })
    }

    /// Whether the recovered depth lies between the two glass planes.
    pub fn is_inside_chamber(&self) -> bool {
        (0.0..=CHAMBER_DEPTH).contains(&self.depth_cm)
    }
}

/// Angles between the parent's direction of flight and each daughter track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningAngles {
    pub phi_proton: Real,
    pub phi_pion: Real,
}

impl OpeningAngles {
    /// Both angles must lie in `[0, π]`; NaN and infinities are rejected.
    pub fn validate(&self) -> Result<(), SessionError> {
        for (track, value) in [("proton", self.phi_proton), ("pion", self.phi_pion)] {
            if !(0.0..=PI).contains(&value) {
                return Err(SessionError::InvalidAngle { track, value });
            }
        }
        Ok(())
    }
}

/// Measurements and calibration of a single candidate decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayRecord {
    pub(crate) name: String,
    pub(crate) kind: DecayKind,
    pub(crate) slice: Option<Slice>,
    pub(crate) radius_points: Option<[Pt2; 3]>,
    pub(crate) radius_px: Option<Real>,
    pub(crate) length_points: Option<[Pt2; 2]>,
    pub(crate) decay_length_px: Option<Real>,
    pub(crate) origin_vertex: Option<StereoshiftMeasurement>,
    pub(crate) decay_vertex: Option<StereoshiftMeasurement>,
    pub(crate) opening_angles: Option<OpeningAngles>,
    pub(crate) calibration: Option<Magnification>,
}

impl DecayRecord {
    /// Empty record named after its decay hypothesis.
    pub fn new(kind: DecayKind) -> Self {
        Self {
            name: kind.label().to_string(),
            kind,
            slice: None,
            radius_points: None,
            radius_px: None,
            length_points: None,
            decay_length_px: None,
            origin_vertex: None,
            decay_vertex: None,
            opening_angles: None,
            calibration: None,
        }
    }

    pub fn with_slice(mut self, slice: Option<Slice>) -> Self {
        self.slice = slice;
        self
    }

    pub fn with_calibration(mut self, calibration: Option<Magnification>) -> Self {
        self.calibration = calibration;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DecayKind {
        self.kind
    }

    pub fn slice(&self) -> Option<Slice> {
        self.slice
    }

    pub fn radius_points(&self) -> Option<[Pt2; 3]> {
        self.radius_points
    }

    pub fn radius_px(&self) -> Option<Real> {
        self.radius_px
    }

    pub fn length_points(&self) -> Option<[Pt2; 2]> {
        self.length_points
    }

    pub fn decay_length_px(&self) -> Option<Real> {
        self.decay_length_px
    }

    pub fn stereoshift(&self, vertex: Vertex) -> Option<&StereoshiftMeasurement> {
        match vertex {
            Vertex::Origin => self.origin_vertex.as_ref(),
            Vertex::Decay => self.decay_vertex.as_ref(),
        }
    }

    pub fn opening_angles(&self) -> Option<OpeningAngles> {
        self.opening_angles
    }

    pub fn calibration(&self) -> Option<Magnification> {
        self.calibration
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters
    // ─────────────────────────────────────────────────────────────────────────

    /// Store three points on a track and recompute its radius in pixels.
    ///
    /// # Errors
    ///
    /// [`GeometryError::DegenerateGeometry`] for collinear points; the record
    /// is left untouched.
    pub fn set_radius_points(&mut self, r1: Pt2, r2: Pt2, r3: Pt2) -> Result<Real, GeometryError> {
        let r = radius(r1, r2, r3)?;
        self.radius_points = Some([r1, r2, r3]);
        self.radius_px = Some(r);
        Ok(r)
    }

    /// Store the two vertices and recompute the decay length in pixels.
    pub fn set_length_points(&mut self, d1: Pt2, d2: Pt2) -> Real {
        let l = length(d1, d2);
        self.length_points = Some([d1, d2]);
        self.decay_length_px = Some(l);
        l
    }

    pub fn set_origin_vertex_stereoshift(&mut self, measurement: StereoshiftMeasurement) {
        self.origin_vertex = Some(measurement);
    }

    pub fn set_decay_vertex_stereoshift(&mut self, measurement: StereoshiftMeasurement) {
        self.decay_vertex = Some(measurement);
    }

    pub fn set_stereoshift(&mut self, vertex: Vertex, measurement: StereoshiftMeasurement) {
        match vertex {
            Vertex::Origin => self.set_origin_vertex_stereoshift(measurement),
            Vertex::Decay => self.set_decay_vertex_stereoshift(measurement),
        }
    }

    /// # Errors
    ///
    /// [`SessionError::InvalidAngle`] when either angle is outside `[0, π]`;
    /// the record is left untouched.
    pub fn set_opening_angles(&mut self, angles: OpeningAngles) -> Result<(), SessionError> {
        angles.validate()?;
        self.opening_angles = Some(angles);
        Ok(())
    }

    /// Overwrite the magnification coefficients. Pixel values are untouched.
    pub fn set_calibration(&mut self, a: Real, b: Real) {
        self.calibration = Some(Magnification::new(a, b));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calibrated views
    // ─────────────────────────────────────────────────────────────────────────

    pub fn origin_vertex_depth_cm(&self) -> Option<Real> {
        self.origin_vertex.map(|m| m.depth_cm)
    }

    pub fn decay_vertex_depth_cm(&self) -> Option<Real> {
        self.decay_vertex.map(|m| m.depth_cm)
    }

    /// Magnification at the origin vertex depth, or at the front glass when
    /// that depth has not been measured.
    pub fn magnification(&self) -> Option<Real> {
        let m = self.calibration?;
        Some(m.at(self.origin_vertex_depth_cm().unwrap_or(0.0)))
    }

    pub fn radius_cm(&self) -> Option<Real> {
        Some(self.magnification()? * self.radius_px?)
    }

    pub fn decay_length_cm(&self) -> Option<Real> {
        Some(self.magnification()? * self.decay_length_px?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_and_capabilities() {
        for (i, kind) in DecayKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index() as usize, i + 1);
            assert_eq!(DecayKind::from_index(kind.index()), Some(kind));
            assert!(kind.has_decay_length());
        }
        assert_eq!(DecayKind::from_index(0), None);
        assert_eq!(DecayKind::from_index(6), None);
        assert!(DecayKind::SigmaMinusToNeutronPiMinus.has_radius());
        assert!(!DecayKind::LambdaToNeutronPiZero.has_radius());
        assert!(DecayKind::LambdaToProtonPiMinus.has_opening_angles());
        assert!(!DecayKind::SigmaPlusToProtonPiZero.has_opening_angles());
        assert_eq!(DecayKind::LambdaToProtonPiMinus.to_string(), "Λ⁰ ⇨ p + π⁻");
    }

    #[test]
    fn collinear_radius_leaves_record_untouched() {
        let mut record = DecayRecord::new(DecayKind::SigmaPlusToProtonPiZero);
        record
            .set_radius_points(Pt2::new(0.0, 1.0), Pt2::new(1.0, 0.0), Pt2::new(0.0, -1.0))
            .unwrap();
        let before = record.clone();

        let err = record
            .set_radius_points(Pt2::new(0.0, 0.0), Pt2::new(1.0, 1.0), Pt2::new(2.0, 2.0))
            .unwrap_err();
        assert_eq!(err, GeometryError::DegenerateGeometry);
        assert_eq!(record, before);
    }

    #[test]
    fn calibrated_values_follow_origin_depth() {
        let mut record = DecayRecord::new(DecayKind::LambdaToProtonPiMinus);
        record.set_length_points(Pt2::new(0.0, 0.0), Pt2::new(30.0, 40.0));
        assert_eq!(record.decay_length_px(), Some(50.0));
        assert_eq!(record.decay_length_cm(), None);

        record.set_calibration(0.5, 0.1);
        assert_eq!(record.magnification(), Some(0.5));
        assert!((record.decay_length_cm().unwrap() - 25.0).abs() < 1e-12);

        let m = StereoshiftMeasurement::measure(
            [Pt2::new(0.0, 1.0), Pt2::new(1.0, 0.0)],
            [Pt2::new(0.0, 0.5), Pt2::new(0.5, 0.0)],
            [Pt2::origin(), Pt2::origin()],
            ReferencePlane::Front,
        )
        .unwrap();
        record.set_origin_vertex_stereoshift(m);
        let z = 0.5 * CHAMBER_DEPTH;
        assert!((record.origin_vertex_depth_cm().unwrap() - z).abs() < 1e-12);
        assert!((record.magnification().unwrap() - (0.5 + 0.1 * z)).abs() < 1e-12);
        assert!((record.decay_length_cm().unwrap() - 50.0 * (0.5 + 0.1 * z)).abs() < 1e-9);
        assert_eq!(record.decay_length_px(), Some(50.0));
        assert_eq!(record.decay_vertex_depth_cm(), None);
    }

    #[test]
    fn stereoshift_measurement_subtracts_reference_motion() {
        let offsets = [Pt2::new(10.0, 0.0), Pt2::new(12.0, 0.0)];
        let m = StereoshiftMeasurement::measure(
            [Pt2::new(50.0, 0.0), Pt2::new(56.0, 0.0)],
            [Pt2::new(30.0, 5.0), Pt2::new(34.0, 5.0)],
            offsets,
            ReferencePlane::Back,
        )
        .unwrap();
        assert!((m.shift_fiducial - 4.0).abs() < 1e-12);
        assert!((m.shift_point - 2.0).abs() < 1e-12);
        assert!((m.stereoshift - 0.5).abs() < 1e-12);
        assert!((m.depth_cm - 0.5 * CHAMBER_DEPTH).abs() < 1e-12);
        assert_eq!(m.sf1, Pt2::new(50.0, 0.0));
        assert!(m.is_inside_chamber());

        let err = StereoshiftMeasurement::measure(
            [Pt2::new(10.0, 0.0), Pt2::new(12.0, 0.0)],
            [Pt2::new(30.0, 5.0), Pt2::new(34.0, 5.0)],
            offsets,
            ReferencePlane::Front,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::ZeroFiducialShift);
    }

    #[test]
    fn opening_angles_must_be_in_range() {
        let mut record = DecayRecord::new(DecayKind::LambdaToProtonPiMinus);
        let valid = OpeningAngles {
            phi_proton: 0.0,
            phi_pion: PI,
        };
        record.set_opening_angles(valid).unwrap();

        let invalid = [(Real::NAN, 0.3), (0.3, -0.1), (0.3, 4.0), (Real::INFINITY, 0.3)];
        for (phi_proton, phi_pion) in invalid {
            let err = record
                .set_opening_angles(OpeningAngles {
                    phi_proton,
                    phi_pion,
                })
                .unwrap_err();
            assert!(matches!(err, SessionError::InvalidAngle { .. }));
            assert_eq!(record.opening_angles(), Some(valid));
        }
    }
}
