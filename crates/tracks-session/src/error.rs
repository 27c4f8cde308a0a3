use thiserror::Error;
use tracks_core::{GeometryError, Real};

use crate::decay::{DecayKind, Slice};

/// Failures surfaced by the measurement session and its serialisers.
///
/// None of them is fatal: a failing call leaves the session exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("no decay is selected")]
    NoSelection,

    #[error("expected {expected} points, got {got}")]
    WrongPointCount { expected: usize, got: usize },

    #[error("points were picked on {found}, but {displayed} is displayed")]
    SliceMismatch { displayed: Slice, found: Slice },

    #[error("unrecognised file format for {0:?}")]
    UnknownFormat(String),

    #[error("no decay at index {index} (session holds {len})")]
    NoSuchRecord { index: usize, len: usize },

    #[error("{operation} does not apply to {kind}")]
    NotApplicable {
        operation: &'static str,
        kind: DecayKind,
    },

    #[error("opening angle of the {track} track is {value}, expected a value in [0, π]")]
    InvalidAngle { track: &'static str, value: Real },

    #[error("invalid data folder: {0}")]
    Layout(String),

    #[error("session schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: u32, supported: u32 },

    #[error("table line {line}: {message}")]
    Table { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
