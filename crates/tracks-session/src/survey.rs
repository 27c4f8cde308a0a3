//! Combined stereoshift and magnification survey.
//!
//! The student picks one front and one rear fiducial in both stereo views, a
//! second fiducial on each plane in the first view, and the point of interest
//! in both views. From those picks we derive the reference-corrected
//! stereoshift of the point and the magnification law of the chamber.

use log::info;
use serde::{Deserialize, Serialize};
use tracks_core::{
    Fiducial, FiducialPlane, Magnification, ObservedFiducial, Pt2, ReferencePlane, magnification,
};

use crate::decay::StereoshiftMeasurement;
use crate::error::Result;

/// A fiducial picked in both stereo views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StereoPick {
    pub name: String,
    pub views: [Pt2; 2],
}

/// A fiducial picked in the first view only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePick {
    pub name: String,
    pub position: Pt2,
}

/// All picks of one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSurvey {
    pub front: StereoPick,
    pub front_baseline: SinglePick,
    pub back: StereoPick,
    pub back_baseline: SinglePick,
    pub point: [Pt2; 2],
    pub reference: ReferencePlane,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyResult {
    pub stereoshift: StereoshiftMeasurement,
    pub magnification: Magnification,
}

impl CalibrationSurvey {
    /// Evaluate the survey.
    ///
    /// The fiducial on the reference plane provides the per-view offsets; the
    /// fiducial on the opposite plane provides the stereoshift denominator.
    /// Magnification uses the first-view positions of all four fiducials.
    ///
    /// # Errors
    ///
    /// Geometry errors for unknown names, marks on the wrong plane, coincident
    /// fiducials or a vanishing fiducial shift.
    pub fn evaluate(&self) -> Result<SurveyResult> {
        let front = Fiducial::lookup_on(&self.front.name, FiducialPlane::Front)?;
        let front_baseline = Fiducial::lookup_on(&self.front_baseline.name, FiducialPlane::Front)?;
        let back = Fiducial::lookup_on(&self.back.name, FiducialPlane::Back)?;
        let back_baseline = Fiducial::lookup_on(&self.back_baseline.name, FiducialPlane::Back)?;

        let (offsets, fiducial) = match self.reference {
            ReferencePlane::Front => (self.front.views, self.back.views),
            ReferencePlane::Back => (self.back.views, self.front.views),
        };
        let stereoshift =
            StereoshiftMeasurement::measure(fiducial, self.point, offsets, self.reference)?;

        let magnification = magnification(
            &ObservedFiducial::new(front, self.front.views[0]),
            &ObservedFiducial::new(front_baseline, self.front_baseline.position),
            &ObservedFiducial::new(back, self.back.views[0]),
            &ObservedFiducial::new(back_baseline, self.back_baseline.position),
        )?;

        info!(
            "survey: stereoshift {:.4}, depth {:.3} cm, magnification a = {}, b = {}",
            stereoshift.stereoshift, stereoshift.depth_cm, magnification.a, magnification.b
        );
        Ok(SurveyResult {
            stereoshift,
            magnification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;
    use tracks_core::{CHAMBER_DEPTH, GeometryError};

    /// Picks consistent with a chamber imaged at unit scale where the rear
    /// plane moves by (4, 0) between views and the front plane by (1, 0).
    fn survey(reference: ReferencePlane) -> CalibrationSurvey {
        let front = Fiducial::lookup("C'").unwrap();
        let front_b = Fiducial::lookup("F'").unwrap();
        let back = Fiducial::lookup("C").unwrap();
        let back_b = Fiducial::lookup("F").unwrap();
        let shift = |p: Pt2, dx: f64| Pt2::new(p.x + dx, p.y);
        CalibrationSurvey {
            front: StereoPick {
                name: "C'".into(),
                views: [front.position(), shift(front.position(), 1.0)],
            },
            front_baseline: SinglePick {
                name: "F\u{2032}".into(),
                position: front_b.position(),
            },
            back: StereoPick {
                name: "C".into(),
                views: [back.position(), shift(back.position(), 4.0)],
            },
            back_baseline: SinglePick {
                name: "F".into(),
                position: back_b.position(),
            },
            // Point a quarter of the way into the chamber: shift 1 + 0.25 * 3.
            point: [Pt2::new(5.0, 5.0), Pt2::new(6.75, 5.0)],
            reference,
        }
    }

    #[test]
    fn front_reference_survey() {
        let result = survey(ReferencePlane::Front).evaluate().unwrap();
        assert!((result.stereoshift.shift_fiducial - 3.0).abs() < 1e-12);
        assert!((result.stereoshift.shift_point - 0.75).abs() < 1e-12);
        assert!((result.stereoshift.stereoshift - 0.25).abs() < 1e-12);
        assert!((result.stereoshift.depth_cm - 0.25 * CHAMBER_DEPTH).abs() < 1e-12);
        assert!((result.magnification.a - 1.0).abs() < 1e-12);
        assert!(result.magnification.b.abs() < 1e-12);
    }

    #[test]
    fn back_reference_survey_agrees_on_depth() {
        let result = survey(ReferencePlane::Back).evaluate().unwrap();
        // Relative to the rear plane the point moves by 2.25 against 3.
        assert!((result.stereoshift.stereoshift - 0.75).abs() < 1e-12);
        assert!((result.stereoshift.depth_cm - 0.25 * CHAMBER_DEPTH).abs() < 1e-12);
    }

    #[test]
    fn fiducials_must_be_on_their_planes() {
        let mut s = survey(ReferencePlane::Front);
        s.back_baseline.name = "D'".into();
        let err = s.evaluate().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Geometry(GeometryError::WrongPlane { .. })
        ));

        s.back_baseline.name = "Q".into();
        assert!(matches!(
            s.evaluate().unwrap_err(),
            SessionError::Geometry(GeometryError::UnknownFiducial(_))
        ));
    }
}
