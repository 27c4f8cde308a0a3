use thiserror::Error;

use crate::fiducial::FiducialPlane;

/// Failures of the geometry and optics primitives.
///
/// All variants are local to the operation that raised them: callers are
/// expected to report the error and keep their state unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("points are collinear, no circle passes through them")]
    DegenerateGeometry,
    #[error("segment has zero length")]
    ZeroLengthSegment,
    #[error("line is vertical, slope is undefined")]
    VerticalLine,
    #[error("reference fiducial did not move between views")]
    ZeroFiducialShift,
    #[error("fiducials {0} and {1} are observed at the same position")]
    CoincidentFiducials(String, String),
    #[error("fiducial {name} lies on the {actual} plane, expected the {expected} plane")]
    WrongPlane {
        name: String,
        expected: FiducialPlane,
        actual: FiducialPlane,
    },
    #[error("unknown fiducial mark {0:?}")]
    UnknownFiducial(String),
}
