//! Structural integrity checking and mechanical repair.
//!
//! Operates on the *raw* persisted record array (`serde_json::Value`), not
//! the typed model, because the whole point is to catch payloads the typed
//! decoder would reject. The checker validates that the collection is an
//! array of objects, each with required `id`/`name` fields and all
//! remaining fields drawn from the known optional set.

use podium_model::Record;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Fields every record must carry.
const REQUIRED_FIELDS: [&str; 2] = ["id", "name"];

/// The known optional fields and their expected shapes.
const OPTIONAL_STRING_FIELDS: [&str; 9] = [
    "email",
    "organization",
    "jobTitle",
    "phone",
    "topic",
    "status",
    "notes",
    "dateContacted",
    "scheduledDate",
];
const OPTIONAL_BOOL_FIELDS: [&str; 1] = ["rotarian"];
const OPTIONAL_LIST_FIELDS: [&str; 1] = ["links"];

/// How bad a corruption flag is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Tolerated and reported (an unknown field, e.g. from a newer
    /// client).
    Advisory,
    /// Mechanically safe to fix in place (id/name defects).
    Repairable,
    /// Only a restore can help.
    Fatal,
}

/// One structural defect found in the persisted record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptionFlag {
    /// The record collection is not an array.
    NotAnArray,
    /// An element of the collection is not an object.
    NotAnObject {
        /// Position in the collection.
        index: usize,
    },
    /// A required field is missing (or empty, for `name`).
    MissingField {
        /// Position in the collection.
        index: usize,
        /// The missing field.
        field: &'static str,
    },
    /// A field holds a value of the wrong type.
    WrongType {
        /// Position in the collection.
        index: usize,
        /// The offending field.
        field: String,
    },
    /// A field outside the known set.
    UnknownField {
        /// Position in the collection.
        index: usize,
        /// The unexpected field.
        field: String,
    },
    /// Two or more records share an id.
    DuplicateId {
        /// The duplicated id.
        id: u64,
    },
}

impl CorruptionFlag {
    /// Classifies the flag for the repair-vs-restore decision.
    pub fn severity(&self) -> Severity {
        match self {
            CorruptionFlag::UnknownField { .. } => Severity::Advisory,
            CorruptionFlag::MissingField { .. } | CorruptionFlag::DuplicateId { .. } => {
                Severity::Repairable
            }
            CorruptionFlag::WrongType { field, .. } if field == "id" || field == "name" => {
                Severity::Repairable
            }
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for CorruptionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionFlag::NotAnArray => write!(f, "record collection is not an array"),
            CorruptionFlag::NotAnObject { index } => {
                write!(f, "record {index} is not an object")
            }
            CorruptionFlag::MissingField { index, field } => {
                write!(f, "record {index} missing required field {field:?}")
            }
            CorruptionFlag::WrongType { index, field } => {
                write!(f, "record {index} field {field:?} has the wrong type")
            }
            CorruptionFlag::UnknownField { index, field } => {
                write!(f, "record {index} has unexpected field {field:?}")
            }
            CorruptionFlag::DuplicateId { id } => write!(f, "duplicate record id {id}"),
        }
    }
}

/// Validates the raw record collection, returning every defect found.
///
/// An empty result means the collection is structurally sound.
pub fn detect(records: &Value) -> Vec<CorruptionFlag> {
    let Some(items) = records.as_array() else {
        return vec![CorruptionFlag::NotAnArray];
    };

    let mut flags = Vec::new();
    let mut seen_ids = BTreeSet::new();
    let mut duplicate_ids = BTreeSet::new();

    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            flags.push(CorruptionFlag::NotAnObject { index });
            continue;
        };

        match object.get("id") {
            None => flags.push(CorruptionFlag::MissingField { index, field: "id" }),
            Some(value) => match value.as_u64() {
                Some(id) => {
                    if !seen_ids.insert(id) {
                        duplicate_ids.insert(id);
                    }
                }
                None => flags.push(CorruptionFlag::WrongType {
                    index,
                    field: "id".to_owned(),
                }),
            },
        }

        match object.get("name") {
            None => flags.push(CorruptionFlag::MissingField {
                index,
                field: "name",
            }),
            Some(Value::String(name)) if name.is_empty() => {
                flags.push(CorruptionFlag::MissingField {
                    index,
                    field: "name",
                })
            }
            Some(Value::String(_)) => {}
            Some(_) => flags.push(CorruptionFlag::WrongType {
                index,
                field: "name".to_owned(),
            }),
        }

        for (field, value) in object {
            let field = field.as_str();
            if REQUIRED_FIELDS.contains(&field) {
                continue;
            }
            if OPTIONAL_STRING_FIELDS.contains(&field) {
                if !value.is_string() {
                    flags.push(CorruptionFlag::WrongType {
                        index,
                        field: field.to_owned(),
                    });
                }
            } else if OPTIONAL_BOOL_FIELDS.contains(&field) {
                if !value.is_boolean() {
                    flags.push(CorruptionFlag::WrongType {
                        index,
                        field: field.to_owned(),
                    });
                }
            } else if OPTIONAL_LIST_FIELDS.contains(&field) {
                let all_strings = value
                    .as_array()
                    .is_some_and(|items| items.iter().all(Value::is_string));
                if !all_strings {
                    flags.push(CorruptionFlag::WrongType {
                        index,
                        field: field.to_owned(),
                    });
                }
            } else {
                flags.push(CorruptionFlag::UnknownField {
                    index,
                    field: field.to_owned(),
                });
            }
        }
    }

    flags.extend(
        duplicate_ids
            .into_iter()
            .map(|id| CorruptionFlag::DuplicateId { id }),
    );
    flags
}

/// What a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Records that received a fresh id (missing or wrong-typed).
    pub assigned_ids: usize,
    /// Records that received a default name.
    pub defaulted_names: usize,
    /// Records whose duplicate id was reassigned.
    pub reassigned_duplicates: usize,
}

impl RepairReport {
    /// True when the pass changed anything.
    pub fn changed(&self) -> bool {
        self.assigned_ids > 0 || self.defaulted_names > 0 || self.reassigned_duplicates > 0
    }
}

/// Repairs id/name defects in place and returns the typed records.
///
/// Fresh ids are assigned monotonically above the current maximum; records
/// lacking a usable name get `Speaker <id>`; duplicated ids keep the first
/// occurrence and reassign the rest. Only call this when every flag from
/// [`detect`] is at most [`Severity::Repairable`]; other defects are not
/// mechanically fixable.
pub fn repair(records: &Value) -> serde_json::Result<(Vec<Record>, RepairReport)> {
    let items = records.as_array().cloned().unwrap_or_default();
    let mut report = RepairReport::default();

    let mut objects: Vec<serde_json::Map<String, Value>> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .collect();

    let mut max_id = objects
        .iter()
        .filter_map(|object| object.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0);

    for object in &mut objects {
        if object.get("id").and_then(Value::as_u64).is_none() {
            max_id += 1;
            object.insert("id".to_owned(), Value::from(max_id));
            report.assigned_ids += 1;
        }
    }

    let mut seen = BTreeSet::new();
    for object in &mut objects {
        // Safe after the pass above.
        let id = object.get("id").and_then(Value::as_u64).unwrap_or(0);
        if !seen.insert(id) {
            max_id += 1;
            object.insert("id".to_owned(), Value::from(max_id));
            seen.insert(max_id);
            report.reassigned_duplicates += 1;
        }
    }

    for object in &mut objects {
        let usable = matches!(object.get("name"), Some(Value::String(s)) if !s.is_empty());
        if !usable {
            let id = object.get("id").and_then(Value::as_u64).unwrap_or(0);
            object.insert("name".to_owned(), Value::from(format!("Speaker {id}")));
            report.defaulted_names += 1;
        }
    }

    let records = objects
        .into_iter()
        .map(|object| serde_json::from_value(Value::Object(object)))
        .collect::<serde_json::Result<Vec<Record>>>()?;

    Ok((records, report))
}
