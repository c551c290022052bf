//! Append-only change journal.
//!
//! Every sync-relevant mutation appends one entry: external edits via
//! [`crate::LocalRepository::record_change`], dataset replacements via
//! [`crate::LocalRepository::save_dataset`]. Incremental backups drain the
//! journal deterministically; a full backup clears it because the snapshot
//! supersedes everything before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of mutation produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// The external record owner mutated the record set.
    LocalEdit,
    /// The core persisted a whole new dataset (merge apply, repair,
    /// restore).
    DatasetReplaced,
}

/// One entry in the change journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// When the change happened.
    pub timestamp: DateTime<Utc>,
    /// Dataset version at the time of the change.
    pub version: u64,
    /// Checksum of the dataset after the change, when the core computed
    /// one. Absent for external edits, which only announce that something
    /// changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
    /// What produced the entry.
    pub kind: ChangeKind,
}

impl ChangeEntry {
    /// Entry for an external edit.
    pub fn local_edit(timestamp: DateTime<Utc>, version: u64) -> Self {
        Self {
            timestamp,
            version,
            checksum: None,
            kind: ChangeKind::LocalEdit,
        }
    }

    /// Entry for a dataset replacement with a known checksum.
    pub fn dataset_replaced(timestamp: DateTime<Utc>, version: u64, checksum: u32) -> Self {
        Self {
            timestamp,
            version,
            checksum: Some(checksum),
            kind: ChangeKind::DatasetReplaced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_roundtrip() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let entry = ChangeEntry::dataset_replaced(t, 7, 0xDEAD_BEEF);

        let json = serde_json::to_string(&entry).unwrap();
        let back: ChangeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.kind, ChangeKind::DatasetReplaced);
    }

    #[test]
    fn local_edit_has_no_checksum() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let json = serde_json::to_value(ChangeEntry::local_edit(t, 3)).unwrap();
        assert!(json.get("checksum").is_none());
        assert_eq!(json["kind"], "localEdit");
    }
}
