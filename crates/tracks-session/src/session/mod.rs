//! Measurement session framework.
//!
//! A session is a mutable container: the viewer creates records, routes
//! picked points into the selected record and finally saves the session.
//!
//! ```no_run
//! use tracks_session::session::{MeasurementSession, SaveFormat};
//! use tracks_session::DecayKind;
//! # fn main() -> Result<(), tracks_session::SessionError> {
//!
//! let mut session = MeasurementSession::with_description("bench 3");
//! session.append_decay(DecayKind::LambdaToProtonPiMinus, None);
//!
//! if session.should_prompt_save() {
//!     session.save("decays.csv", SaveFormat::Table)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod measurement;
pub mod types;

pub use measurement::{
    CALIBRATED_COLUMNS, MeasurementSession, PIXEL_COLUMNS, SCHEMA_VERSION, SaveFormat,
};
pub use types::{LogEntry, SessionMetadata, current_timestamp};
