//! Decay records and the measurement session.
//!
//! This crate holds everything between the viewer and the geometry kernel in
//! `tracks-core`:
//!
//! - [`DecayRecord`]: raw picks and pixel quantities of one candidate decay,
//!   with calibrated values computed on read,
//! - [`MeasurementSession`]: the ordered set of records sharing one
//!   magnification law, with selection and persistence,
//! - the TABLE export ([`table`]) and the JSON snapshot,
//! - the stereoshift/magnification [`survey`],
//! - environment [`settings`] and the data-folder layout ([`dataset`]).

pub mod angles;
pub mod dataset;
pub mod decay;
mod error;
pub mod session;
pub mod settings;
pub mod survey;
pub mod table;

pub use angles::{DecayAngles, DecayVertexLines};
pub use dataset::{VIEW_NAMES, ViewLayout, event_permutation};
pub use decay::{
    DecayKind, DecayRecord, OpeningAngles, Slice, SlicePoint, StereoshiftMeasurement, Vertex,
};
pub use error::{Result, SessionError};
pub use session::{LogEntry, MeasurementSession, SaveFormat, SessionMetadata};
pub use settings::Settings;
pub use survey::{CalibrationSurvey, SinglePick, StereoPick, SurveyResult};
pub use table::{TABLE_COLUMNS, read_table, write_table};
