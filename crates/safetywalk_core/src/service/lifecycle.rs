//! Issue lifecycle coordinator.
//!
//! # Responsibility
//! - Create, advance, resolve, edit and delete POI records.
//! - Decide when lifecycle notifications fire.
//!
//! # Invariants
//! - `advance_status` only acts on `Reported` records; anything else is a
//!   silent no-op.
//! - `resolve` leaves `status == Resolved` and the resolved type.
//! - Only resolved-type records can be deleted.
//! - A "new-issue" notice fires only after `mark_notified` reports the flip,
//!   so each record is announced at most once.

use crate::model::poi_type::TypeCatalog;
use crate::model::record::{IssueStatus, Placement, Record, RecordFields, RecordKind};
use crate::notify::payload::{LifecycleNotice, NoticeKind};
use crate::repo::record_repo::RepoError;
use crate::service::menu::display_id;
use crate::service::view_sync::ViewSynchronizer;
use crate::service::PluginContext;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Lifecycle operation failure.
#[derive(Debug)]
pub enum LifecycleError {
    Repo(RepoError),
    /// Operation requires an issue-type record.
    NotAnIssue(String),
    /// Delete attempted on a record that is not resolved.
    DeleteNotAllowed(String),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::NotAnIssue(id) => write!(f, "poi is not a maintenance issue: {id}"),
            Self::DeleteNotAllowed(id) => write!(f, "only resolved issues can be deleted: {id}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Owns the per-record state machine and its side effects.
pub struct LifecycleCoordinator {
    ctx: PluginContext,
    catalog: Arc<TypeCatalog>,
    sync: Arc<ViewSynchronizer>,
}

impl LifecycleCoordinator {
    pub fn new(ctx: PluginContext, catalog: Arc<TypeCatalog>, sync: Arc<ViewSynchronizer>) -> Self {
        Self { ctx, catalog, sync }
    }

    /// Persists a new record of `kind` built from dialog fields.
    ///
    /// Issue records start `Reported`; every new record starts un-notified.
    /// On success the view flies to the record and a refresh cycle runs.
    pub fn create_record(
        &self,
        fields: &RecordFields,
        kind: RecordKind,
        placement: Option<Placement>,
        point_of_view: Option<Placement>,
    ) -> LifecycleResult<Record> {
        let mut record = self.ctx.records.create(self.catalog.handle(kind));
        record.apply_fields(fields);
        record.status = match kind {
            RecordKind::Deferred => Some(IssueStatus::Reported),
            RecordKind::Resolved => Some(IssueStatus::Resolved),
            RecordKind::Instruction => None,
        };
        record.notified = false;
        record.placement = placement;
        record.point_of_view = point_of_view;

        let saved = self.persist(&record).map_err(|err| {
            error!("event=poi_create module=lifecycle status=error kind={kind:?} error={err}");
            err
        })?;
        info!(
            "event=poi_create module=lifecycle status=ok kind={kind:?} poi_id={}",
            display_id(&saved)
        );
        self.refresh_views();
        Ok(saved)
    }

    /// Moves a `Reported` issue to `BeingResolved` and sends "fix-issue".
    ///
    /// Records in any other state are returned unchanged with no side effect.
    pub fn advance_status(&self, record: &Record) -> LifecycleResult<Record> {
        let is_open_issue = self.catalog.classify(&record.poi_type) == Some(RecordKind::Deferred);
        if !is_open_issue || record.status != Some(IssueStatus::Reported) {
            debug!(
                "event=poi_advance module=lifecycle status=skip poi_id={} current={:?}",
                display_id(record),
                record.status
            );
            return Ok(record.clone());
        }

        let mut next = record.clone();
        next.status = Some(IssueStatus::BeingResolved);
        self.notify(NoticeKind::FixIssue, &next);
        let saved = self.persist(&next)?;
        info!("event=poi_advance module=lifecycle status=ok poi_id={}", display_id(&saved));
        self.refresh_views();
        Ok(saved)
    }

    /// Marks an issue resolved and sends "resolve-issue".
    ///
    /// Already-resolved records are returned unchanged.
    pub fn resolve(&self, record: &Record) -> LifecycleResult<Record> {
        let kind = self.catalog.classify(&record.poi_type);
        match kind {
            Some(RecordKind::Resolved) => {
                debug!(
                    "event=poi_resolve module=lifecycle status=skip poi_id={} reason=already_resolved",
                    display_id(record)
                );
                return Ok(record.clone());
            }
            Some(RecordKind::Deferred) => {}
            _ => return Err(LifecycleError::NotAnIssue(display_id(record))),
        }

        let current = record.status.unwrap_or(IssueStatus::Reported);
        if !current.can_transition_to(IssueStatus::Resolved) {
            warn!(
                "event=poi_resolve module=lifecycle status=skip poi_id={} current={current:?}",
                display_id(record)
            );
            return Ok(record.clone());
        }

        let mut next = record.clone();
        next.poi_type = self.catalog.handle(RecordKind::Resolved).clone();
        next.status = Some(IssueStatus::Resolved);
        self.notify(NoticeKind::ResolveIssue, &next);
        let saved = self.persist(&next)?;
        info!("event=poi_resolve module=lifecycle status=ok poi_id={}", display_id(&saved));
        self.refresh_views();
        Ok(saved)
    }

    /// Removes a resolved issue, then refreshes.
    pub fn delete_record(&self, record: &Record) -> LifecycleResult<()> {
        if self.catalog.classify(&record.poi_type) != Some(RecordKind::Resolved) {
            return Err(LifecycleError::DeleteNotAllowed(display_id(record)));
        }

        self.ctx.records.remove(record).map_err(|err| {
            error!(
                "event=poi_delete module=lifecycle status=error poi_id={} error={err}",
                display_id(record)
            );
            err
        })?;
        info!("event=poi_delete module=lifecycle status=ok poi_id={}", display_id(record));
        self.refresh_views();
        Ok(())
    }

    /// Replaces title and description, persists and refreshes.
    pub fn edit_record(&self, record: &Record, fields: &RecordFields) -> LifecycleResult<Record> {
        let mut next = record.clone();
        next.title = fields.title.clone();
        next.description = Some(fields.description.clone()).filter(|d| !d.is_empty());
        let saved = self.persist(&next)?;
        info!("event=poi_edit module=lifecycle status=ok poi_id={}", display_id(&saved));
        self.refresh_views();
        Ok(saved)
    }

    /// Announces every un-notified record once; returns the number announced.
    pub fn ensure_notified(&self, records: &mut [Record]) -> usize {
        ensure_notified(&self.ctx, records)
    }

    fn notify(&self, kind: NoticeKind, record: &Record) {
        self.ctx
            .notifier
            .send(LifecycleNotice::for_record(kind, record).into());
    }

    /// Saves, takes the first returned record and flies the view to it.
    fn persist(&self, record: &Record) -> LifecycleResult<Record> {
        let saved = self
            .ctx
            .records
            .save(record)?
            .into_iter()
            .next()
            .ok_or(RepoError::EmptySaveResult)?;
        if let Err(err) = self.ctx.view.go_to_poi(&saved) {
            error!(
                "event=poi_navigate module=lifecycle status=error poi_id={} error={err}",
                display_id(&saved)
            );
        }
        Ok(saved)
    }

    fn refresh_views(&self) {
        if let Err(err) = self.sync.refresh() {
            error!("event=view_refresh module=lifecycle status=error error={err}");
        }
    }
}

/// Shared by the coordinator and the refresh cycle.
pub(crate) fn ensure_notified(ctx: &PluginContext, records: &mut [Record]) -> usize {
    let mut announced = 0;
    for record in records.iter_mut().filter(|record| !record.notified) {
        let Some(id) = record.id else {
            warn!("event=poi_notify module=lifecycle status=skip reason=unsaved");
            continue;
        };

        match ctx.records.mark_notified(id) {
            Ok(true) => {
                ctx.notifier
                    .send(LifecycleNotice::for_record(NoticeKind::NewIssue, record).into());
                record.notified = true;
                announced += 1;
                info!("event=poi_notify module=lifecycle status=ok poi_id={id}");
            }
            Ok(false) => {
                record.notified = true;
                debug!("event=poi_notify module=lifecycle status=skip poi_id={id} reason=already_notified");
            }
            Err(err) => {
                error!("event=poi_notify module=lifecycle status=error poi_id={id} error={err}");
            }
        }
    }
    announced
}
