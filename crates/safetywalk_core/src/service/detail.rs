//! Issue detail panel descriptor.

use crate::model::poi_type::TypeCatalog;
use crate::model::record::{IssueStatus, Record, RecordKind};

/// Action offered by the detail panel's resolution button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAction {
    Resolve,
    Delete,
}

impl ResolutionAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Resolve => "Resolve",
            Self::Delete => "Delete",
        }
    }
}

/// Buttons on the detail panel that mutate the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailCommand {
    AdvanceStatus,
    Resolve,
    Delete,
}

/// Everything the host needs to render the detail panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub record: Record,
    pub title: String,
    pub icon_url: Option<String>,
    /// Empty when the record has no description.
    pub description: String,
    /// The "being fixed" button is only offered for freshly reported issues.
    pub show_status_button: bool,
    pub resolution: ResolutionAction,
}

impl DetailView {
    pub fn build(record: &Record, catalog: &TypeCatalog, icon_base_url: &str) -> Self {
        let kind = catalog.classify(&record.poi_type);
        let resolution = if kind == Some(RecordKind::Resolved) {
            ResolutionAction::Delete
        } else {
            ResolutionAction::Resolve
        };
        let show_status_button =
            kind == Some(RecordKind::Deferred) && record.status == Some(IssueStatus::Reported);

        Self {
            record: record.clone(),
            title: record.title.clone(),
            icon_url: record
                .icon
                .as_deref()
                .map(|icon| format!("{icon_base_url}{icon}")),
            description: record.description_or_empty().to_string(),
            show_status_button,
            resolution,
        }
    }

    /// Commands the panel currently offers.
    pub fn available_commands(&self) -> Vec<DetailCommand> {
        let mut commands = Vec::new();
        if self.show_status_button {
            commands.push(DetailCommand::AdvanceStatus);
        }
        commands.push(match self.resolution {
            ResolutionAction::Resolve => DetailCommand::Resolve,
            ResolutionAction::Delete => DetailCommand::Delete,
        });
        commands
    }
}
