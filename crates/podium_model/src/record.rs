//! Speaker records and field-level diff value objects.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline status of a speaker record.
///
/// The set is closed; decoding an unknown or missing status falls back to
/// [`SpeakerStatus::Ideas`] rather than failing, so a record with a
/// hand-edited status string still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpeakerStatus {
    /// Candidate, not yet contacted.
    #[default]
    Ideas,
    /// Contact has been made.
    Approached,
    /// Speaker agreed to present.
    Agreed,
    /// A date is on the calendar.
    Scheduled,
    /// The talk happened.
    Spoken,
    /// No longer pursued.
    Dropped,
}

impl SpeakerStatus {
    /// All statuses, in pipeline order.
    pub const ALL: [SpeakerStatus; 6] = [
        SpeakerStatus::Ideas,
        SpeakerStatus::Approached,
        SpeakerStatus::Agreed,
        SpeakerStatus::Scheduled,
        SpeakerStatus::Spoken,
        SpeakerStatus::Dropped,
    ];

    /// Returns the wire-format name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerStatus::Ideas => "Ideas",
            SpeakerStatus::Approached => "Approached",
            SpeakerStatus::Agreed => "Agreed",
            SpeakerStatus::Scheduled => "Scheduled",
            SpeakerStatus::Spoken => "Spoken",
            SpeakerStatus::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for SpeakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeakerStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpeakerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModelError::UnknownStatus(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for SpeakerStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// One speaker in the roster.
///
/// Field names serialize in camelCase to match the document format the
/// remote store holds (`jobTitle`, `dateContacted`, ...). Unknown fields in
/// a decoded record are ignored here; the integrity checker flags them from
/// the raw form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier within the dataset.
    pub id: u64,
    /// Display name. Required and non-empty for a valid record.
    pub name: String,
    /// Pipeline status.
    #[serde(default)]
    pub status: SpeakerStatus,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Employer or affiliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Job title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Proposed talk topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Whether the speaker is a club member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotarian: Option<bool>,
    /// Related links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the speaker was first contacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_contacted: Option<String>,
    /// When the talk is scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
}

impl Record {
    /// Creates a record with the given id and name, status `Ideas`, and all
    /// optional fields unset.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: SpeakerStatus::default(),
            email: None,
            organization: None,
            job_title: None,
            phone: None,
            topic: None,
            rotarian: None,
            links: Vec::new(),
            notes: None,
            date_contacted: None,
            scheduled_date: None,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: SpeakerStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the links.
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the club-member flag.
    pub fn with_rotarian(mut self, rotarian: bool) -> Self {
        self.rotarian = Some(rotarian);
        self
    }

    /// Returns the value of a diffable field, or `None` when the field is
    /// unset or empty.
    ///
    /// Empty strings and empty lists count as absent, matching how the
    /// merge rules decide which side "has" a value.
    pub fn field(&self, name: FieldName) -> Option<FieldValue> {
        fn text(s: &str) -> Option<FieldValue> {
            if s.is_empty() {
                None
            } else {
                Some(FieldValue::Text(s.to_owned()))
            }
        }
        fn opt(s: &Option<String>) -> Option<FieldValue> {
            s.as_deref().and_then(text)
        }

        match name {
            FieldName::Name => text(&self.name),
            FieldName::Status => Some(FieldValue::Text(self.status.as_str().to_owned())),
            FieldName::Email => opt(&self.email),
            FieldName::Organization => opt(&self.organization),
            FieldName::JobTitle => opt(&self.job_title),
            FieldName::Phone => opt(&self.phone),
            FieldName::Topic => opt(&self.topic),
            FieldName::Rotarian => self.rotarian.map(FieldValue::Flag),
            FieldName::Links => {
                if self.links.is_empty() {
                    None
                } else {
                    Some(FieldValue::List(self.links.clone()))
                }
            }
            FieldName::Notes => opt(&self.notes),
            FieldName::DateContacted => opt(&self.date_contacted),
            FieldName::ScheduledDate => opt(&self.scheduled_date),
        }
    }

    /// Writes a field value back onto the record.
    ///
    /// Values of the wrong kind for the field are ignored, as is clearing
    /// the required `name` field. An unparseable status value leaves the
    /// current status in place.
    pub fn set_field(&mut self, name: FieldName, value: Option<FieldValue>) {
        fn as_text(value: Option<FieldValue>) -> Option<String> {
            match value {
                Some(FieldValue::Text(s)) => Some(s),
                _ => None,
            }
        }

        match name {
            FieldName::Name => {
                if let Some(FieldValue::Text(s)) = value {
                    self.name = s;
                }
            }
            FieldName::Status => {
                if let Some(FieldValue::Text(s)) = value {
                    if let Ok(status) = s.parse() {
                        self.status = status;
                    }
                }
            }
            FieldName::Email => self.email = as_text(value),
            FieldName::Organization => self.organization = as_text(value),
            FieldName::JobTitle => self.job_title = as_text(value),
            FieldName::Phone => self.phone = as_text(value),
            FieldName::Topic => self.topic = as_text(value),
            FieldName::Rotarian => {
                self.rotarian = match value {
                    Some(FieldValue::Flag(b)) => Some(b),
                    _ => None,
                }
            }
            FieldName::Links => {
                self.links = match value {
                    Some(FieldValue::List(l)) => l,
                    _ => Vec::new(),
                }
            }
            FieldName::Notes => self.notes = as_text(value),
            FieldName::DateContacted => self.date_contacted = as_text(value),
            FieldName::ScheduledDate => self.scheduled_date = as_text(value),
        }
    }
}

/// The diffable fields of a record (everything except `id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    /// Display name.
    Name,
    /// Pipeline status.
    Status,
    /// Contact email.
    Email,
    /// Employer or affiliation.
    Organization,
    /// Job title.
    JobTitle,
    /// Contact phone number.
    Phone,
    /// Proposed talk topic.
    Topic,
    /// Club-member flag.
    Rotarian,
    /// Related links.
    Links,
    /// Free-form notes.
    Notes,
    /// First-contact date.
    DateContacted,
    /// Scheduled talk date.
    ScheduledDate,
}

impl FieldName {
    /// All diffable fields.
    pub const ALL: [FieldName; 12] = [
        FieldName::Name,
        FieldName::Status,
        FieldName::Email,
        FieldName::Organization,
        FieldName::JobTitle,
        FieldName::Phone,
        FieldName::Topic,
        FieldName::Rotarian,
        FieldName::Links,
        FieldName::Notes,
        FieldName::DateContacted,
        FieldName::ScheduledDate,
    ];

    /// Returns the wire-format name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Status => "status",
            FieldName::Email => "email",
            FieldName::Organization => "organization",
            FieldName::JobTitle => "jobTitle",
            FieldName::Phone => "phone",
            FieldName::Topic => "topic",
            FieldName::Rotarian => "rotarian",
            FieldName::Links => "links",
            FieldName::Notes => "notes",
            FieldName::DateContacted => "dateContacted",
            FieldName::ScheduledDate => "scheduledDate",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of one diffable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A scalar string value (also carries statuses and dates).
    Text(String),
    /// A boolean flag.
    Flag(bool),
    /// A list of strings.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns true when the value counts as absent for merge purposes.
    ///
    /// `Flag(false)` is empty: the document format treats a false flag and
    /// a missing one the same way during a merge.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Flag(b) => !b,
            FieldValue::List(l) => l.is_empty(),
        }
    }
}

/// One field-level divergence between the local and remote copy of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    /// The field that differs.
    pub field: FieldName,
    /// Local value, if set.
    pub local: Option<FieldValue>,
    /// Remote value, if set.
    pub remote: Option<FieldValue>,
}

/// A detected collision on one record id.
///
/// Conflicts are transient: they are produced during a merge and surfaced
/// through events, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    /// The colliding record id.
    pub record_id: u64,
    /// Display name of the record (local side, falling back to remote).
    pub record_name: String,
    /// Every field that differs between the two sides.
    pub differences: Vec<FieldDiff>,
}

/// How colliding records are resolved during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Keep the local record, discard the remote one.
    Local,
    /// Keep the remote record, discard the local one.
    Remote,
    /// Field-level merge; local wins true scalar conflicts.
    #[default]
    Merge,
}

impl FromStr for MergeStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(MergeStrategy::Local),
            "remote" => Ok(MergeStrategy::Remote),
            "merge" => Ok(MergeStrategy::Merge),
            other => Err(ModelError::UnknownStrategy(other.to_owned())),
        }
    }
}
