//! Session bookkeeping types: metadata and the operation log.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Metadata about a measurement session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Snapshot schema version the session was written with.
    pub schema_version: u32,

    /// Unix timestamp when the session was created (seconds since epoch).
    pub created_at: u64,

    /// Unix timestamp when the session was last modified (seconds since epoch).
    pub last_modified: u64,

    /// Optional user-provided description (student, group, exercise).
    pub description: Option<String>,
}

impl SessionMetadata {
    pub fn new(schema_version: u32) -> Self {
        let now = current_timestamp();
        Self {
            schema_version,
            created_at: now,
            last_modified: now,
            description: None,
        }
    }

    pub fn with_description(schema_version: u32, description: impl Into<String>) -> Self {
        let mut meta = Self::new(schema_version);
        meta.description = Some(description.into());
        meta
    }

    /// Update the last_modified timestamp to now.
    pub fn touch(&mut self) {
        self.last_modified = current_timestamp();
    }
}

/// Lightweight operation log entry.
///
/// An audit trail of what the student did, not a replay journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: u64,

    /// Operation name (e.g. "append", "calibrate", "radius").
    pub operation: String,

    pub notes: Option<String>,
}

impl LogEntry {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            operation: operation.into(),
            notes: None,
        }
    }

    pub fn with_notes(operation: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::new(operation)
        }
    }
}

/// Current Unix timestamp in seconds; zero if the clock predates the epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_new() {
        let meta = SessionMetadata::new(1);
        assert_eq!(meta.schema_version, 1);
        assert!(meta.created_at > 0);
        assert_eq!(meta.created_at, meta.last_modified);
        assert!(meta.description.is_none());

        let meta = SessionMetadata::with_description(1, "bench 4");
        assert_eq!(meta.description.as_deref(), Some("bench 4"));
    }

    #[test]
    fn metadata_touch() {
        let mut meta = SessionMetadata::new(1);
        let original = meta.last_modified;
        meta.touch();
        assert!(meta.last_modified >= original);
    }

    #[test]
    fn log_entry_notes() {
        let entry = LogEntry::new("append");
        assert_eq!(entry.operation, "append");
        assert!(entry.notes.is_none());

        let entry = LogEntry::with_notes("calibrate", "a = 0.5, b = 0");
        assert_eq!(entry.notes.as_deref(), Some("a = 0.5, b = 0"));
        assert!(entry.timestamp > 0);
    }
}
