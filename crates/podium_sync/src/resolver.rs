//! Field-level conflict detection and resolution.
//!
//! Everything in this module is pure: records and datasets in, records,
//! datasets, and conflicts out. No clocks (callers pass `now`), no I/O.

use chrono::{DateTime, Utc};
use podium_model::{Conflict, Dataset, FieldDiff, FieldName, FieldValue, MergeStrategy, Record};

/// Computes the field-level differences between two copies of a record.
///
/// Every field whose values differ structurally produces one [`FieldDiff`];
/// an empty result means the copies are structurally identical (the
/// conflict-free case). `diff(r, r)` is always empty.
pub fn diff(local: &Record, remote: &Record) -> Vec<FieldDiff> {
    FieldName::ALL
        .into_iter()
        .filter_map(|field| {
            let local_value = local.field(field);
            let remote_value = remote.field(field);
            if local_value == remote_value {
                None
            } else {
                Some(FieldDiff {
                    field,
                    local: local_value,
                    remote: remote_value,
                })
            }
        })
        .collect()
}

/// Resolves two colliding copies of a record into one.
///
/// Under [`MergeStrategy::Merge`], per field: exactly one side non-empty
/// takes it; two non-empty lists take the duplicate-free union; two
/// non-empty scalars are a true conflict and **local wins** - an explicit
/// tie-break, not a smarter negotiation.
pub fn resolve(local: &Record, remote: &Record, strategy: MergeStrategy) -> Record {
    match strategy {
        MergeStrategy::Local => local.clone(),
        MergeStrategy::Remote => remote.clone(),
        MergeStrategy::Merge => {
            let mut merged = local.clone();
            for field in FieldName::ALL {
                merged.set_field(field, merge_field(local.field(field), remote.field(field)));
            }
            merged
        }
    }
}

fn merge_field(
    local: Option<FieldValue>,
    remote: Option<FieldValue>,
) -> Option<FieldValue> {
    match (local, remote) {
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
        (Some(l), Some(r)) => {
            if l == r {
                return Some(l);
            }
            match (l.is_empty(), r.is_empty()) {
                (true, false) => Some(r),
                (false, true) | (true, true) => Some(l),
                (false, false) => match (l, r) {
                    (FieldValue::List(a), FieldValue::List(b)) => {
                        Some(FieldValue::List(list_union(a, b)))
                    }
                    // True scalar conflict: local wins.
                    (l, _) => Some(l),
                },
            }
        }
    }
}

fn list_union(mut a: Vec<String>, b: Vec<String>) -> Vec<String> {
    for item in b {
        if !a.contains(&item) {
            a.push(item);
        }
    }
    a
}

/// The result of merging two datasets.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged dataset: `version = max(local, remote) + 1`,
    /// `last_modified = now`.
    pub dataset: Dataset,
    /// One conflict per record id whose copies diverged.
    pub conflicts: Vec<Conflict>,
}

/// Merges a local and a remote dataset record-by-record.
///
/// The union of record ids is kept: records present on only one side pass
/// through unchanged (remote-side order first, then local-only records);
/// records present on both sides are diffed, and any divergence is
/// collected as a [`Conflict`] with the record replaced by its resolution.
pub fn merge_datasets(
    local: &Dataset,
    remote: &Dataset,
    strategy: MergeStrategy,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let mut conflicts = Vec::new();
    let mut merged = Vec::with_capacity(remote.speakers.len() + local.speakers.len());

    for remote_record in &remote.speakers {
        match local.speakers.iter().find(|l| l.id == remote_record.id) {
            Some(local_record) => {
                let differences = diff(local_record, remote_record);
                if differences.is_empty() {
                    merged.push(remote_record.clone());
                } else {
                    conflicts.push(Conflict {
                        record_id: local_record.id,
                        record_name: if local_record.name.is_empty() {
                            remote_record.name.clone()
                        } else {
                            local_record.name.clone()
                        },
                        differences,
                    });
                    merged.push(resolve(local_record, remote_record, strategy));
                }
            }
            None => merged.push(remote_record.clone()),
        }
    }

    for local_record in &local.speakers {
        if !remote.speakers.iter().any(|r| r.id == local_record.id) {
            merged.push(local_record.clone());
        }
    }

    MergeOutcome {
        dataset: Dataset {
            version: local.version.max(remote.version) + 1,
            last_modified: now,
            speakers: merged,
            metadata: remote.metadata.clone(),
        },
        conflicts,
    }
}
