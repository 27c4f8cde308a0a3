//! The measurement session aggregate.
//!
//! A [`MeasurementSession`] owns the ordered list of decay records, the
//! session-wide calibration and the current selection. Every mutation goes
//! through a method on the session; records are only handed out by shared
//! reference, so the calibration copy inside each record can only change
//! through [`MeasurementSession::update_calibration`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tracks_core::{Magnification, Pt2, Real, ReferencePlane};

use super::types::{LogEntry, SessionMetadata};
use crate::angles::{DecayAngles, DecayVertexLines};
use crate::decay::{
    DecayKind, DecayRecord, OpeningAngles, Slice, SlicePoint, StereoshiftMeasurement, Vertex,
};
use crate::error::{Result, SessionError};
use crate::settings::Settings;
use crate::table::{read_table, write_table};

/// Snapshot schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Columns shown by the viewer table when pixel values are displayed.
pub const PIXEL_COLUMNS: [&str; 7] = [
    "name",
    "radius_px",
    "decay_length_px",
    "origin_vertex_depth_cm",
    "magnification",
    "phi_proton",
    "phi_pion",
];

/// Columns shown by the viewer table when calibrated values are displayed.
pub const CALIBRATED_COLUMNS: [&str; 7] = [
    "name",
    "radius_cm",
    "decay_length_cm",
    "origin_vertex_depth_cm",
    "magnification",
    "phi_proton",
    "phi_pion",
];

/// On-disk representation used by [`MeasurementSession::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFormat {
    /// Comma-separated table, one line per record.
    Table,
    /// JSON dump of the whole session.
    Snapshot,
}

impl SaveFormat {
    /// Infer the format from the file extension (`.csv` or `.json`).
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownFormat`] for any other extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(SaveFormat::Table),
            Some("json") => Ok(SaveFormat::Snapshot),
            _ => Err(SessionError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Ordered decay records with a shared calibration and a single selection.
///
/// # Example
///
/// ```
/// use tracks_session::{DecayKind, MeasurementSession, Slice, SlicePoint};
/// use tracks_core::Magnification;
///
/// let slice = Slice::new(0, 3);
/// let mut session = MeasurementSession::new();
/// session.append_decay(DecayKind::SigmaPlusToProtonPiZero, Some(slice));
///
/// let picks = [
///     SlicePoint::new(0.0, 1.0, slice),
///     SlicePoint::new(1.0, 0.0, slice),
///     SlicePoint::new(0.0, -1.0, slice),
/// ];
/// session.measure_radius(&picks, Some(slice)).unwrap();
/// session.update_calibration(Magnification::new(0.5, 0.0));
///
/// let record = session.selected_record().unwrap();
/// assert!((record.radius_cm().unwrap() - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSession {
    pub metadata: SessionMetadata,
    calibration: Option<Magnification>,
    records: Vec<DecayRecord>,
    selected: Option<usize>,
    calibrated_view: bool,
    log: Vec<LogEntry>,
    /// Accept every measurement regardless of decay kind. Taken from the
    /// environment, never persisted.
    #[serde(skip)]
    dev_bypass: bool,
}

impl MeasurementSession {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    pub fn new() -> Self {
        Self::with_metadata(SessionMetadata::new(SCHEMA_VERSION))
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self::with_metadata(SessionMetadata::with_description(SCHEMA_VERSION, description))
    }

    fn with_metadata(metadata: SessionMetadata) -> Self {
        Self {
            metadata,
            calibration: None,
            records: Vec::new(),
            selected: None,
            calibrated_view: false,
            log: Vec::new(),
            dev_bypass: false,
        }
    }

    /// Apply environment settings to this session.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.set_dev_bypass(settings.dev_bypass);
        self
    }

    /// Enable or disable the decay-kind checks on measurements.
    pub fn set_dev_bypass(&mut self, enabled: bool) {
        if enabled {
            warn!("development bypass enabled, decay-kind checks are skipped");
        }
        self.dev_bypass = enabled;
    }

    pub fn dev_bypass(&self) -> bool {
        self.dev_bypass
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn records(&self) -> &[DecayRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&DecayRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn calibration(&self) -> Option<Magnification> {
        self.calibration
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&DecayRecord> {
        self.selected.and_then(|i| self.records.get(i))
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Record management
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a record stamped with the current calibration and the slice it
    /// was started on, select it and return its index.
    pub fn append_decay(&mut self, kind: DecayKind, slice: Option<Slice>) -> usize {
        let record = DecayRecord::new(kind)
            .with_slice(slice)
            .with_calibration(self.calibration);
        self.records.push(record);
        let index = self.records.len() - 1;
        self.selected = Some(index);
        info!("appended decay {index} ({kind})");
        self.record_operation(LogEntry::with_notes("append", format!("{index}: {kind}")));
        index
    }

    /// Select the record at `index`.
    pub fn select(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove the record at `index` and return it.
    ///
    /// Remaining records keep their stored event and view numbers. If the
    /// selected record is deleted the selection is cleared; a selection
    /// after `index` moves down with its record.
    pub fn delete(&mut self, index: usize) -> Result<DecayRecord> {
        self.check_index(index)?;
        let removed = self.records.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        info!("deleted decay {index} ({})", removed.kind());
        self.record_operation(LogEntry::with_notes("delete", index.to_string()));
        Ok(removed)
    }

    pub fn delete_selected(&mut self) -> Result<DecayRecord> {
        let index = self.selected.ok_or(SessionError::NoSelection)?;
        self.delete(index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calibration
    // ─────────────────────────────────────────────────────────────────────────

    /// Write the magnification law to the session and every record.
    pub fn update_calibration(&mut self, calibration: Magnification) {
        self.calibration = Some(calibration);
        for record in &mut self.records {
            record.set_calibration(calibration.a, calibration.b);
        }
        info!(
            "calibration a = {}, b = {} applied to {} records",
            calibration.a,
            calibration.b,
            self.records.len()
        );
        self.record_operation(LogEntry::with_notes(
            "calibrate",
            format!("a = {}, b = {}", calibration.a, calibration.b),
        ));
    }

    /// Switch the viewer table between pixel and calibrated values.
    pub fn apply_calibration_view(&mut self, enabled: bool) {
        self.calibrated_view = enabled;
    }

    pub fn calibrated_view(&self) -> bool {
        self.calibrated_view
    }

    pub fn visible_columns(&self) -> &'static [&'static str] {
        if self.calibrated_view {
            &CALIBRATED_COLUMNS
        } else {
            &PIXEL_COLUMNS
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Measurements on the selected record
    // ─────────────────────────────────────────────────────────────────────────

    /// Radius of the track through three picked points.
    ///
    /// `displayed` is the slice currently shown by the viewer; when absent,
    /// the points must at least agree with each other.
    pub fn measure_radius(
        &mut self,
        points: &[SlicePoint],
        displayed: Option<Slice>,
    ) -> Result<Real> {
        check_points(points, 3, displayed)?;
        self.check_applies("radius", DecayKind::has_radius)?;
        let (index, record) = self.selected_mut()?;
        let r = record.set_radius_points(points[0].point, points[1].point, points[2].point)?;
        debug!("decay {index}: radius {r} px");
        self.record_operation(LogEntry::with_notes("radius", format!("{index}: {r} px")));
        Ok(r)
    }

    /// Decay length between two picked vertices.
    pub fn measure_length(
        &mut self,
        points: &[SlicePoint],
        displayed: Option<Slice>,
    ) -> Result<Real> {
        check_points(points, 2, displayed)?;
        self.check_applies("decay length", DecayKind::has_decay_length)?;
        let (index, record) = self.selected_mut()?;
        let l = record.set_length_points(points[0].point, points[1].point);
        debug!("decay {index}: decay length {l} px");
        self.record_operation(LogEntry::with_notes("length", format!("{index}: {l} px")));
        Ok(l)
    }

    /// Measure a stereoshift from four picks `[sf1, sf2, sp1, sp2]` and store
    /// it on the selected record.
    ///
    /// `offsets` is the reference-plane mark in the two views.
    pub fn measure_stereoshift(
        &mut self,
        vertex: Vertex,
        points: &[Pt2],
        offsets: [Pt2; 2],
        plane: ReferencePlane,
    ) -> Result<StereoshiftMeasurement> {
        let [sf1, sf2, sp1, sp2] = *points else {
            return Err(SessionError::WrongPointCount {
                expected: 4,
                got: points.len(),
            });
        };
        self.selected_mut()?;
        let m = StereoshiftMeasurement::measure([sf1, sf2], [sp1, sp2], offsets, plane)?;
        self.set_stereoshift(vertex, m)?;
        Ok(m)
    }

    /// Store a complete stereoshift measurement on the selected record.
    pub fn set_stereoshift(
        &mut self,
        vertex: Vertex,
        measurement: StereoshiftMeasurement,
    ) -> Result<()> {
        let (index, record) = self.selected_mut()?;
        record.set_stereoshift(vertex, measurement);
        self.record_operation(LogEntry::with_notes(
            "stereoshift",
            format!("{index}: {vertex:?} depth {} cm", measurement.depth_cm),
        ));
        Ok(())
    }

    /// Store opening angles on the selected record.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidAngle`] when either angle is not in `[0, π]`.
    pub fn set_opening_angles(&mut self, angles: OpeningAngles) -> Result<()> {
        self.check_applies("opening angles", DecayKind::has_opening_angles)?;
        let (index, record) = self.selected_mut()?;
        record.set_opening_angles(angles)?;
        self.record_operation(LogEntry::with_notes(
            "angles",
            format!("{index}: {} / {}", angles.phi_proton, angles.phi_pion),
        ));
        Ok(())
    }

    /// Measure opening angles from the three lines at the decay vertex and
    /// store them on the selected record.
    pub fn measure_opening_angles(&mut self, lines: &DecayVertexLines) -> Result<DecayAngles> {
        self.check_applies("opening angles", DecayKind::has_opening_angles)?;
        let result = lines.measure()?;
        self.set_opening_angles(result.angles)?;
        Ok(result)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether closing should first offer to save.
    pub fn should_prompt_save(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn save(&self, path: impl AsRef<Path>, format: SaveFormat) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            SaveFormat::Table => write_table(&self.records, &mut writer)?,
            SaveFormat::Snapshot => {
                serde_json::to_writer_pretty(&mut writer, self)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;
        info!(
            "saved {} records to {} as {format:?}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Save with the format implied by the extension.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let format = SaveFormat::from_path(&path)?;
        self.save(path, format)
    }

    /// Load a session saved in either format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = SaveFormat::from_path(path)?;
        let mut reader = BufReader::new(File::open(path)?);
        let session = match format {
            SaveFormat::Table => Self::from_table(reader)?,
            SaveFormat::Snapshot => {
                let mut json = String::new();
                reader.read_to_string(&mut json)?;
                Self::from_json(&json)?
            }
        };
        info!("loaded {} records from {}", session.len(), path.display());
        Ok(session)
    }

    /// Rebuild a session from a TABLE export.
    ///
    /// The session calibration is taken from the first calibrated record.
    pub fn from_table(reader: impl Read) -> Result<Self> {
        let records = read_table(reader)?;
        let mut session = Self::new();
        session.calibration = records.iter().find_map(DecayRecord::calibration);
        session.records = records;
        Ok(session)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a snapshot, refusing schemas newer than this build.
    pub fn from_json(json: &str) -> Result<Self> {
        let session: Self = serde_json::from_str(json)?;
        if session.metadata.schema_version > SCHEMA_VERSION {
            return Err(SessionError::SchemaVersion {
                found: session.metadata.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.records.len() {
            return Err(SessionError::NoSuchRecord {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }

    /// Refuse an operation the selected decay kind does not support, unless
    /// the development bypass is on.
    fn check_applies(&self, operation: &'static str, applies: fn(DecayKind) -> bool) -> Result<()> {
        let kind = self.selected_record().ok_or(SessionError::NoSelection)?.kind();
        if self.dev_bypass || applies(kind) {
            return Ok(());
        }
        Err(SessionError::NotApplicable { operation, kind })
    }

    fn selected_mut(&mut self) -> Result<(usize, &mut DecayRecord)> {
        let index = self.selected.ok_or(SessionError::NoSelection)?;
        let record = self
            .records
            .get_mut(index)
            .ok_or(SessionError::NoSelection)?;
        Ok((index, record))
    }

    fn record_operation(&mut self, entry: LogEntry) {
        self.log.push(entry);
        self.metadata.touch();
    }
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new()
    }
}

fn check_points(points: &[SlicePoint], expected: usize, displayed: Option<Slice>) -> Result<()> {
    if points.len() != expected {
        return Err(SessionError::WrongPointCount {
            expected,
            got: points.len(),
        });
    }
    let Some(reference) = displayed.or_else(|| points.first().map(|p| p.slice)) else {
        return Ok(());
    };
    if let Some(p) = points.iter().find(|p| p.slice != reference) {
        return Err(SessionError::SliceMismatch {
            displayed: reference,
            found: p.slice,
        });
    }
    Ok(())
}
