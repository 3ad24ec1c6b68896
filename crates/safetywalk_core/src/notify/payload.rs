//! JSON payloads posted to the notification endpoint.

use crate::model::record::{Record, RecordFields};
use serde::{Deserialize, Serialize};

/// Lifecycle event reported for an issue record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    NewIssue,
    FixIssue,
    ResolveIssue,
}

/// `{type, title, description?}` payload for lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleNotice {
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LifecycleNotice {
    pub fn for_record(kind: NoticeKind, record: &Record) -> Self {
        Self {
            kind,
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}

/// `{title, description, category, priority?}` payload sent by dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormReport {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl FormReport {
    /// Builds a report; `priority` is omitted for dialogs without one.
    pub fn from_fields(fields: &RecordFields, with_priority: bool) -> Self {
        Self {
            title: fields.title.clone(),
            description: fields.description.clone(),
            category: fields.category.clone(),
            priority: with_priority.then(|| fields.priority.clone()),
        }
    }
}

/// Any payload accepted by a `NotificationSink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    Lifecycle(LifecycleNotice),
    Report(FormReport),
}

impl Notification {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lifecycle(notice) => match notice.kind {
                NoticeKind::NewIssue => "new-issue",
                NoticeKind::FixIssue => "fix-issue",
                NoticeKind::ResolveIssue => "resolve-issue",
            },
            Self::Report(_) => "form-report",
        }
    }
}

impl From<LifecycleNotice> for Notification {
    fn from(value: LifecycleNotice) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<FormReport> for Notification {
    fn from(value: FormReport) -> Self {
        Self::Report(value)
    }
}
