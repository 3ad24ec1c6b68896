//! Dialog form capture.
//!
//! # Responsibility
//! - Hold the text fields and viewpoint flag of an issue/instruction dialog.
//! - Emit a completion on confirm; emit nothing on cancel.
//!
//! # Invariants
//! - Closing the dialog, by confirm or cancel, clears every field.
//! - No validation beyond presence: empty strings pass through.
//! - Under `ReportPolicy::ForwardOnConfirm` the report is posted exactly once
//!   per confirm, before the completion is returned.

use crate::model::record::RecordFields;
use crate::notify::payload::FormReport;
use crate::notify::NotificationSink;
use log::{debug, info};

/// Which dialog is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Maintenance issue; carries a priority field.
    Issue,
    /// Instruction annotation; has no priority field.
    Instruction,
}

impl DialogKind {
    fn has_priority(self) -> bool {
        matches!(self, Self::Issue)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Instruction => "instruction",
        }
    }
}

/// Who posts the form report to the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPolicy {
    /// The form posts the report itself on confirm.
    #[default]
    ForwardOnConfirm,
    /// The form never posts; the caller decides using `FormCompletion::report`.
    CallerDecides,
}

/// Where a dismiss click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissTarget {
    CloseControl,
    /// Outside the dialog boundary.
    Backdrop,
    /// Inside the dialog body; ignored.
    Content,
}

/// Values emitted when the user confirms the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCompletion {
    pub kind: DialogKind,
    pub fields: RecordFields,
    pub use_current_viewpoint: bool,
    pub report: FormReport,
    /// Whether the form already posted `report`.
    pub reported: bool,
}

/// State of one modal dialog.
#[derive(Debug, Clone)]
pub struct FormCapture {
    kind: DialogKind,
    policy: ReportPolicy,
    fields: RecordFields,
    use_current_viewpoint: bool,
    open: bool,
}

impl FormCapture {
    pub fn new(kind: DialogKind, policy: ReportPolicy) -> Self {
        Self {
            kind,
            policy,
            fields: RecordFields::default(),
            use_current_viewpoint: false,
            open: false,
        }
    }

    /// Shows the dialog pre-filled with `initial`.
    pub fn open(&mut self, initial: RecordFields) {
        self.fields = initial;
        if !self.kind.has_priority() {
            self.fields.priority.clear();
        }
        self.use_current_viewpoint = false;
        self.open = true;
        debug!("event=form_open module=form status=ok kind={}", self.kind.as_str());
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }

    /// Editable fields while the dialog is shown.
    pub fn fields_mut(&mut self) -> &mut RecordFields {
        &mut self.fields
    }

    pub fn set_use_current_viewpoint(&mut self, value: bool) {
        self.use_current_viewpoint = value;
    }

    /// Confirms the dialog; returns `None` when it is not open.
    pub fn confirm(&mut self, sink: &dyn NotificationSink) -> Option<FormCompletion> {
        if !self.open {
            return None;
        }

        let fields = std::mem::take(&mut self.fields);
        let report = FormReport::from_fields(&fields, self.kind.has_priority());
        let reported = match self.policy {
            ReportPolicy::ForwardOnConfirm => {
                sink.send(report.clone().into());
                true
            }
            ReportPolicy::CallerDecides => false,
        };
        let use_current_viewpoint = self.use_current_viewpoint;
        self.close();

        info!(
            "event=form_confirm module=form status=ok kind={} reported={reported}",
            self.kind.as_str()
        );
        Some(FormCompletion {
            kind: self.kind,
            fields,
            use_current_viewpoint,
            report,
            reported,
        })
    }

    /// Closes without emitting anything.
    pub fn cancel(&mut self) {
        if self.open {
            debug!("event=form_cancel module=form status=ok kind={}", self.kind.as_str());
        }
        self.close();
    }

    /// Handles a click that may close the dialog.
    ///
    /// Returns whether the dialog was closed.
    pub fn dismiss(&mut self, target: DismissTarget) -> bool {
        match target {
            DismissTarget::CloseControl | DismissTarget::Backdrop if self.open => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    fn close(&mut self) {
        self.fields = RecordFields::default();
        self.use_current_viewpoint = false;
        self.open = false;
    }
}
