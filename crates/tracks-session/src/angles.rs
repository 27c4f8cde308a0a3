//! Opening angles at a decay vertex.

use serde::{Deserialize, Serialize};
use tracks_core::{GeometryError, Pt2, Segment, TrackParameters, angle, track_parameters};

use crate::decay::OpeningAngles;

/// The three tracks meeting at a decay vertex.
///
/// All lines share `vertex`, so the common-origin requirement holds by
/// construction. The parent track is drawn from the vertex back towards where
/// the parent came from; it is reversed before measuring so that it points
/// along the direction of flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayVertexLines {
    pub vertex: Pt2,
    /// A point on the parent track, upstream of the vertex.
    pub parent_end: Pt2,
    pub proton_end: Pt2,
    pub pion_end: Pt2,
}

/// Opening angles together with the slope/intercept of each line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayAngles {
    pub angles: OpeningAngles,
    /// Parent, proton and pion tracks; `None` for a vertical line.
    pub tracks: [Option<TrackParameters>; 3],
}

impl DecayVertexLines {
    /// Parent direction of flight, ending at the vertex.
    pub fn parent(&self) -> Segment {
        Segment::new(self.parent_end, self.vertex)
    }

    pub fn proton(&self) -> Segment {
        Segment::new(self.vertex, self.proton_end)
    }

    pub fn pion(&self) -> Segment {
        Segment::new(self.vertex, self.pion_end)
    }

    /// Angles between the parent direction and each daughter.
    ///
    /// # Errors
    ///
    /// [`GeometryError::ZeroLengthSegment`] if any line collapses onto the
    /// vertex.
    pub fn measure(&self) -> Result<DecayAngles, GeometryError> {
        let parent = self.parent();
        let proton = self.proton();
        let pion = self.pion();
        let angles = OpeningAngles {
            phi_proton: angle(&parent, &proton)?,
            phi_pion: angle(&parent, &pion)?,
        };
        let tracks = [parent, proton, pion].map(|line| track_parameters(&line).ok());
        Ok(DecayAngles { angles, tracks })
    }
}
