//! POI record domain model.
//!
//! # Responsibility
//! - Define the record persisted by the host repository.
//! - Own the issue status enumeration and its transition table.
//!
//! # Invariants
//! - `id` is `None` until the repository assigns one on first save.
//! - `notified` flips to `true` at most once and is never reset by core.
//! - `status` is `None` for instruction records.

use crate::model::poi_type::PoiType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier assigned by the record repository.
pub type RecordId = Uuid;

/// Classification of a record inside this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Open maintenance issue (reported or being resolved).
    Deferred,
    /// Issue that has been resolved and may be deleted.
    Resolved,
    /// Instructional annotation with no lifecycle.
    Instruction,
}

impl RecordKind {
    /// Whether records of this kind follow the issue state machine.
    pub fn is_issue(self) -> bool {
        matches!(self, Self::Deferred | Self::Resolved)
    }
}

/// Issue lifecycle state, persisted as integer codes 1/2/3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum IssueStatus {
    Reported,
    BeingResolved,
    Resolved,
}

/// Allowed `(from, to)` status transitions.
const LEGAL_TRANSITIONS: &[(IssueStatus, IssueStatus)] = &[
    (IssueStatus::Reported, IssueStatus::BeingResolved),
    (IssueStatus::Reported, IssueStatus::Resolved),
    (IssueStatus::BeingResolved, IssueStatus::Resolved),
];

impl IssueStatus {
    /// Integer code stored by the host repository.
    pub fn code(self) -> i64 {
        match self {
            Self::Reported => 1,
            Self::BeingResolved => 2,
            Self::Resolved => 3,
        }
    }

    /// Parses a stored integer code.
    pub fn from_code(code: i64) -> Result<Self, InvalidStatusCode> {
        match code {
            1 => Ok(Self::Reported),
            2 => Ok(Self::BeingResolved),
            3 => Ok(Self::Resolved),
            other => Err(InvalidStatusCode(other)),
        }
    }

    /// Returns whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        LEGAL_TRANSITIONS.contains(&(self, next))
    }
}

impl From<IssueStatus> for i64 {
    fn from(value: IssueStatus) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for IssueStatus {
    type Error = InvalidStatusCode;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_code(value)
    }
}

/// Stored status code outside the known 1..=3 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatusCode(pub i64);

impl Display for InvalidStatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid issue status code `{}`; expected 1|2|3", self.0)
    }
}

impl Error for InvalidStatusCode {}

/// Opaque geometry owned by the host viewer.
///
/// Core never inspects the payload; it only stores and forwards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placement(pub Value);

impl Placement {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// User-entered text fields captured by a dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
}

impl RecordFields {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Point-of-interest record as stored by the host repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the repository on first save.
    pub id: Option<RecordId>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// Serialized as `type` to match host naming.
    #[serde(rename = "type")]
    pub poi_type: PoiType,
    pub status: Option<IssueStatus>,
    pub notified: bool,
    /// Icon path relative to the viewer base URL.
    pub icon: Option<String>,
    pub placement: Option<Placement>,
    pub point_of_view: Option<Placement>,
}

impl Record {
    /// Builds an unsaved record of the given type from dialog fields.
    ///
    /// Empty category/priority/description are stored as `None`.
    pub fn draft(poi_type: PoiType, fields: &RecordFields) -> Self {
        let mut record = Self {
            id: None,
            title: String::new(),
            description: None,
            category: None,
            priority: None,
            poi_type,
            status: None,
            notified: false,
            icon: None,
            placement: None,
            point_of_view: None,
        };
        record.apply_fields(fields);
        record
    }

    /// Copies every dialog field onto this record.
    pub fn apply_fields(&mut self, fields: &RecordFields) {
        self.title = fields.title.clone();
        self.description = non_empty(&fields.description);
        self.category = non_empty(&fields.category);
        self.priority = non_empty(&fields.priority);
    }

    /// Returns whether the repository has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Description with absent values rendered as an empty string.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
