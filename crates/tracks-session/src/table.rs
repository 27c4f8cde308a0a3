//! Line-oriented TABLE export.
//!
//! One header line followed by one comma-separated line per record. No
//! quoting is applied, so names must not contain commas. Unset values are
//! written as the sentinels of the historical format:
//!
//! | field | unset |
//! |---|---|
//! | point `[x y]` | `[-1000000 -1000000]` |
//! | pixel / centimetre / depth scalar | `-1` |
//! | opening angle | `-100` |
//! | event / view | `-1` |
//! | calibration | `a = -1`, `b = 0` |
//!
//! Stereoshift measurements are nested as
//! `{sf1;sf2;sp1;sp2;shift_fiducial;shift_point;stereoshift;depth_cm;plane}`.

use std::io;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::warn;
use tracks_core::{Magnification, Pt2, Real, ReferencePlane};

use crate::decay::{DecayKind, DecayRecord, OpeningAngles, Slice, StereoshiftMeasurement};
use crate::error::{Result, SessionError};

pub const TABLE_COLUMNS: [&str; 21] = [
    "name",
    "kind_index",
    "r1",
    "r2",
    "r3",
    "radius_px",
    "radius_cm",
    "d1",
    "d2",
    "decay_length_px",
    "decay_length_cm",
    "magnification_a",
    "magnification_b",
    "origin_vertex_stereoshift",
    "decay_vertex_stereoshift",
    "phi_proton",
    "phi_pion",
    "event_number",
    "view_number",
    "origin_vertex_depth_cm",
    "decay_vertex_depth_cm",
];

const POINT_UNSET: Real = -1.0e6;
const SCALAR_UNSET: Real = -1.0;
const ANGLE_UNSET: Real = -100.0;

/// Write the header and one line per record.
pub fn write_table<W: io::Write>(records: &[DecayRecord], writer: W) -> Result<()> {
    let mut wtr = table_writer(writer);
    wtr.write_record(TABLE_COLUMNS)?;
    for record in records {
        if record.name.contains(',') {
            warn!("record name {:?} contains a comma, the table will not parse back", record.name);
        }
        wtr.write_record(record_fields(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a table back into records.
///
/// Derived columns (centimetre values and depths) are recomputed on read and
/// therefore ignored.
pub fn read_table<R: io::Read>(reader: R) -> Result<Vec<DecayRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    if header.iter().ne(TABLE_COLUMNS) {
        return Err(SessionError::Table {
            line: 1,
            message: format!("unexpected header {:?}", header.iter().collect::<Vec<_>>()),
        });
    }

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        records.push(parse_record(&row?, i + 2)?);
    }
    Ok(records)
}

impl DecayRecord {
    /// The record as a single TABLE line, newline terminated.
    pub fn to_table_line(&self) -> Result<String> {
        let mut wtr = table_writer(Vec::new());
        wtr.write_record(record_fields(self))?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| SessionError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| SessionError::Table {
            line: 0,
            message: e.to_string(),
        })
    }
}

fn table_writer<W: io::Write>(writer: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer)
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

fn record_fields(record: &DecayRecord) -> Vec<String> {
    let r = record.radius_points;
    let d = record.length_points;
    let (a, b) = match record.calibration {
        Some(m) => (m.a, m.b),
        None => (SCALAR_UNSET, 0.0),
    };
    let (phi_proton, phi_pion) = match record.opening_angles {
        Some(o) => (o.phi_proton, o.phi_pion),
        None => (ANGLE_UNSET, ANGLE_UNSET),
    };

    vec![
        record.name.clone(),
        record.kind.index().to_string(),
        point(r.map(|p| p[0])),
        point(r.map(|p| p[1])),
        point(r.map(|p| p[2])),
        scalar(record.radius_px),
        scalar(record.radius_cm()),
        point(d.map(|p| p[0])),
        point(d.map(|p| p[1])),
        scalar(record.decay_length_px),
        scalar(record.decay_length_cm()),
        a.to_string(),
        b.to_string(),
        stereoshift(record.origin_vertex.as_ref()),
        stereoshift(record.decay_vertex.as_ref()),
        phi_proton.to_string(),
        phi_pion.to_string(),
        index(record.slice.map(|s| s.event)),
        index(record.slice.map(|s| s.view)),
        scalar(record.origin_vertex_depth_cm()),
        scalar(record.decay_vertex_depth_cm()),
    ]
}

fn point(p: Option<Pt2>) -> String {
    let p = p.unwrap_or(Pt2::new(POINT_UNSET, POINT_UNSET));
    format!("[{} {}]", p.x, p.y)
}

fn scalar(v: Option<Real>) -> String {
    v.unwrap_or(SCALAR_UNSET).to_string()
}

fn index(v: Option<u32>) -> String {
    v.map_or_else(|| "-1".to_string(), |v| v.to_string())
}

fn stereoshift(m: Option<&StereoshiftMeasurement>) -> String {
    match m {
        Some(m) => format!(
            "{{{};{};{};{};{};{};{};{};{}}}",
            point(Some(m.sf1)),
            point(Some(m.sf2)),
            point(Some(m.sp1)),
            point(Some(m.sp2)),
            m.shift_fiducial,
            m.shift_point,
            m.stereoshift,
            m.depth_cm,
            m.plane,
        ),
        None => format!(
            "{{{p};{p};{p};{p};{s};{s};{s};{s};{}}}",
            ReferencePlane::Front,
            p = point(None),
            s = SCALAR_UNSET,
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

struct Fields<'a> {
    row: &'a StringRecord,
    line: usize,
}

impl Fields<'_> {
    fn err(&self, message: impl Into<String>) -> SessionError {
        SessionError::Table {
            line: self.line,
            message: message.into(),
        }
    }

    fn get(&self, column: usize) -> Result<&str> {
        self.row
            .get(column)
            .map(str::trim)
            .ok_or_else(|| self.err(format!("missing column {}", TABLE_COLUMNS[column])))
    }

    fn number(&self, column: usize) -> Result<Real> {
        parse_number(self.get(column)?)
            .map_err(|m| self.err(format!("{}: {m}", TABLE_COLUMNS[column])))
    }

    fn point(&self, column: usize) -> Result<Option<Pt2>> {
        parse_point(self.get(column)?)
            .map_err(|m| self.err(format!("{}: {m}", TABLE_COLUMNS[column])))
    }

    fn stereoshift(&self, column: usize) -> Result<Option<StereoshiftMeasurement>> {
        parse_stereoshift(self.get(column)?)
            .map_err(|m| self.err(format!("{}: {m}", TABLE_COLUMNS[column])))
    }
}

fn parse_record(row: &StringRecord, line: usize) -> Result<DecayRecord> {
    let f = Fields { row, line };
    if row.len() != TABLE_COLUMNS.len() {
        return Err(f.err(format!(
            "expected {} columns, found {}",
            TABLE_COLUMNS.len(),
            row.len()
        )));
    }

    let kind_index: u8 = f
        .get(1)?
        .parse()
        .map_err(|_| f.err(format!("invalid kind index {:?}", row.get(1).unwrap_or(""))))?;
    let kind = DecayKind::from_index(kind_index)
        .ok_or_else(|| f.err(format!("unknown kind index {kind_index}")))?;

    let radius_points = match (f.point(2)?, f.point(3)?, f.point(4)?) {
        (Some(r1), Some(r2), Some(r3)) => Some([r1, r2, r3]),
        _ => None,
    };
    let length_points = match (f.point(7)?, f.point(8)?) {
        (Some(d1), Some(d2)) => Some([d1, d2]),
        _ => None,
    };

    let a = f.number(11)?;
    let b = f.number(12)?;
    let calibration = (a >= 0.0).then(|| Magnification::new(a, b));

    let phi_proton = f.number(15)?;
    let phi_pion = f.number(16)?;
    let opening_angles = (phi_proton > ANGLE_UNSET && phi_pion > ANGLE_UNSET).then_some(
        OpeningAngles {
            phi_proton,
            phi_pion,
        },
    );
    if let Some(angles) = &opening_angles {
        angles.validate().map_err(|e| f.err(e.to_string()))?;
    }

    let event = f.number(17)?;
    let view = f.number(18)?;
    let slice = (event >= 0.0 && view >= 0.0).then(|| Slice::new(view as u32, event as u32));

    Ok(DecayRecord {
        name: f.get(0)?.to_string(),
        kind,
        slice,
        radius_points,
        radius_px: measured(f.number(5)?),
        length_points,
        decay_length_px: measured(f.number(9)?),
        origin_vertex: f.stereoshift(13)?,
        decay_vertex: f.stereoshift(14)?,
        opening_angles,
        calibration,
    })
}

fn measured(v: Real) -> Option<Real> {
    (v >= 0.0).then_some(v)
}

fn parse_number(s: &str) -> std::result::Result<Real, String> {
    s.trim()
        .parse::<Real>()
        .map_err(|_| format!("invalid number {s:?}"))
}

fn parse_point(s: &str) -> std::result::Result<Option<Pt2>, String> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("invalid point {s:?}"))?;
    let mut parts = inner.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("invalid point {s:?}"));
    };
    let (x, y) = (parse_number(x)?, parse_number(y)?);
    if x == POINT_UNSET && y == POINT_UNSET {
        return Ok(None);
    }
    Ok(Some(Pt2::new(x, y)))
}

fn parse_stereoshift(s: &str) -> std::result::Result<Option<StereoshiftMeasurement>, String> {
    let inner = s
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| format!("invalid stereoshift {s:?}"))?;
    let parts: Vec<&str> = inner.split(';').collect();
    let [sf1, sf2, sp1, sp2, shift_fiducial, shift_point, stereoshift, depth_cm, plane] =
        parts.as_slice()
    else {
        return Err(format!("stereoshift has {} members, expected 9", parts.len()));
    };

    let stereoshift = parse_number(stereoshift)?;
    if stereoshift < 0.0 {
        return Ok(None);
    }
    let point = |s: &str| -> std::result::Result<Pt2, String> {
        parse_point(s)?.ok_or_else(|| format!("unset point {s:?}"))
    };
    Ok(Some(StereoshiftMeasurement {
        sf1: point(*sf1)?,
        sf2: point(*sf2)?,
        sp1: point(*sp1)?,
        sp2: point(*sp2)?,
        shift_fiducial: parse_number(shift_fiducial)?,
        shift_point: parse_number(shift_point)?,
        stereoshift,
        depth_cm: parse_number(depth_cm)?,
        plane: plane.parse()?,
    }))
}
