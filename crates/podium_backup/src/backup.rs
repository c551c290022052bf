//! Backup value objects and the index entry format.

use chrono::{DateTime, Utc};
use podium_core::ChangeEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a backup is a full snapshot or a change descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// Complete dataset snapshot.
    Full,
    /// Drained change-journal entries since the previous backup.
    Incremental,
}

/// The payload of a backup.
///
/// Full payloads hold the dataset as a raw JSON value rather than a typed
/// dataset so an emergency snapshot of a corrupt state is representable;
/// restoring validates the value then. On the wire the variants keep their
/// own key (`data` / `changes`), so a stored backup reads naturally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackupPayload {
    /// A full snapshot.
    Full {
        /// The dataset as stored, possibly corrupt for emergency backups.
        data: serde_json::Value,
    },
    /// A lightweight change descriptor.
    Incremental {
        /// Journal entries covered by this backup.
        changes: Vec<ChangeEntry>,
    },
}

impl BackupPayload {
    /// The snapshot value, for full backups.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            BackupPayload::Full { data } => Some(data),
            BackupPayload::Incremental { .. } => None,
        }
    }

    /// The drained journal entries, for incremental backups.
    pub fn as_changes(&self) -> Option<&[ChangeEntry]> {
        match self {
            BackupPayload::Full { .. } => None,
            BackupPayload::Incremental { changes } => Some(changes),
        }
    }
}

/// An immutable snapshot.
///
/// Never mutated after creation; deleted only by retention cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Unique backup identifier.
    pub id: String,
    /// Full or incremental.
    #[serde(rename = "type")]
    pub kind: BackupKind,
    /// When the backup was created.
    pub timestamp: DateTime<Utc>,
    /// Dataset version at creation time.
    pub version: u64,
    /// Rolling checksum of the payload.
    pub checksum: u32,
    /// The snapshot or change descriptor.
    #[serde(flatten)]
    pub payload: BackupPayload,
    /// Free-form annotations (record count, emergency marker, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// One line of the backup index: everything needed for listing and
/// retention decisions without loading the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupIndexEntry {
    /// Backup identifier.
    pub id: String,
    /// Full or incremental.
    #[serde(rename = "type")]
    pub kind: BackupKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Dataset version at creation time.
    pub version: u64,
    /// Payload checksum.
    pub checksum: u32,
}

impl From<&Backup> for BackupIndexEntry {
    fn from(backup: &Backup) -> Self {
        Self {
            id: backup.id.clone(),
            kind: backup.kind,
            timestamp: backup.timestamp,
            version: backup.version,
            checksum: backup.checksum,
        }
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
    fn full_backup_roundtrip() {
        let backup = Backup {
            id: "backup-1".into(),
            kind: BackupKind::Full,
            timestamp: t0(),
            version: 3,
            checksum: 0x1234,
            payload: BackupPayload::Full {
                data: serde_json::json!({"version": 3, "speakers": []}),
            },
            metadata: BTreeMap::new(),
        };

        let json = serde_json::to_string(&backup).unwrap();
        let back: Backup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, backup);
        assert!(back.payload.as_data().is_some());
    }

    #[test]
    fn wire_shape_matches_document_format() {
        let backup = Backup {
            id: "incremental-1".into(),
            kind: BackupKind::Incremental,
            timestamp: t0(),
            version: 2,
            checksum: 9,
            payload: BackupPayload::Incremental {
                changes: vec![ChangeEntry::local_edit(t0(), 2)],
            },
            metadata: BTreeMap::new(),
        };

        let json = serde_json::to_value(&backup).unwrap();
        assert_eq!(json["type"], "incremental");
        assert!(json["changes"].is_array());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn index_entry_mirrors_backup() {
        let backup = Backup {
            id: "backup-7".into(),
            kind: BackupKind::Full,
            timestamp: t0(),
            version: 7,
            checksum: 42,
            payload: BackupPayload::Full {
                data: serde_json::json!({}),
            },
            metadata: BTreeMap::new(),
        };

        let entry = BackupIndexEntry::from(&backup);
        assert_eq!(entry.id, "backup-7");
        assert_eq!(entry.kind, BackupKind::Full);
        assert_eq!(entry.version, 7);
        assert_eq!(entry.checksum, 42);
    }
}
