//! The dataset: record collection plus version/timestamp bookkeeping.

use crate::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full record collection plus the metadata the sync engine keys off.
///
/// Invariants:
/// - `version` only increases across forward mutations (a restore is an
///   explicit rollback and may lower it);
/// - `last_modified` is updated on every mutation that should be considered
///   for sync;
/// - record ids are unique (the integrity checker enforces and repairs
///   this).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Monotonically non-decreasing dataset version.
    pub version: u64,
    /// Wall-clock timestamp of the last sync-relevant mutation.
    pub last_modified: DateTime<Utc>,
    /// The records.
    #[serde(default)]
    pub speakers: Vec<Record>,
    /// Free-form metadata carried alongside the records.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Dataset {
    /// Creates an empty dataset at version 1 with the given timestamp.
    pub fn new(last_modified: DateTime<Utc>) -> Self {
        Self {
            version: 1,
            last_modified,
            speakers: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a dataset from records, at version 1.
    pub fn with_speakers(last_modified: DateTime<Utc>, speakers: Vec<Record>) -> Self {
        Self {
            speakers,
            ..Self::new(last_modified)
        }
    }

    /// Marks the dataset as modified at `now` without touching the version.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }

    /// Returns the record with the given id, if present.
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.speakers.iter().find(|r| r.id == id)
    }

    /// Returns the next free record id (one above the current maximum).
    pub fn next_id(&self) -> u64 {
        self.speakers.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    /// True when the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn next_id_is_above_maximum() {
        let dataset = Dataset::with_speakers(
            t0(),
            vec![Record::new(3, "A"), Record::new(7, "B"), Record::new(5, "C")],
        );
        assert_eq!(dataset.next_id(), 8);
        assert_eq!(Dataset::new(t0()).next_id(), 1);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let dataset = Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]);
        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json["lastModified"].is_string());
        assert_eq!(json["speakers"][0]["name"], "Ada");
        assert!(json["metadata"].is_object());
    }

    #[test]
    fn decodes_document_without_metadata() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"version":4,"lastModified":"2024-03-01T12:00:00Z","speakers":[]}"#,
        )
        .unwrap();
        assert_eq!(dataset.version, 4);
        assert!(dataset.metadata.is_empty());
    }
}
