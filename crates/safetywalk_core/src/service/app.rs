//! Plugin entry point wiring host events to the lifecycle services.
//!
//! # Responsibility
//! - Resolve the required POI types once at startup.
//! - Subscribe to host click/save events and route them to services.
//! - Drive context-menu, edit and detail-panel flows.
//!
//! # Invariants
//! - A failed type lookup alerts the user and leaves nothing subscribed.
//! - Event handlers hold only a weak reference to the app; dropping the
//!   last `Arc` ends event handling even if `stop` was never called.

use crate::config::AppConfig;
use crate::form::{DialogKind, FormCapture};
use crate::host::events::Subscription;
use crate::model::poi_type::TypeCatalog;
use crate::model::record::{Placement, Record, RecordFields, RecordKind};
use crate::repo::record_repo::RepoError;
use crate::repo::type_repo::PoiTypeDirectory;
use crate::service::detail::{DetailCommand, DetailView};
use crate::service::lifecycle::{LifecycleCoordinator, LifecycleResult};
use crate::service::menu::display_id;
use crate::service::view_sync::{RefreshOutcome, ViewSnapshot, ViewSynchronizer};
use crate::service::PluginContext;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// Startup failure; the plugin stays inactive.
#[derive(Debug)]
pub enum SetupError {
    Directory(RepoError),
    /// Display names of the types that could not be found.
    MissingTypes(Vec<String>),
}

impl SetupError {
    /// Message shown to the user through `ViewSurface::alert`.
    pub fn alert_message(&self) -> String {
        match self {
            Self::Directory(err) => format!("Unable to load POI Types: {err}"),
            Self::MissingTypes(names) => format!("Please create the {} POI Types", join_names(names)),
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(err) => write!(f, "poi type lookup failed: {err}"),
            Self::MissingTypes(names) => write!(f, "missing poi types: {}", names.join(", ")),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            Self::MissingTypes(_) => None,
        }
    }
}

impl From<RepoError> for SetupError {
    fn from(value: RepoError) -> Self {
        Self::Directory(value)
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Looks up the three managed types by localized name.
pub fn resolve_catalog(
    directory: &dyn PoiTypeDirectory,
    config: &AppConfig,
) -> Result<TypeCatalog, SetupError> {
    let types = directory.find_all()?;
    TypeCatalog::from_types(&types, &config.locale, &config.type_names)
        .map_err(SetupError::MissingTypes)
}

/// Entries the plugin contributes to the viewer context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    ReportIssue,
    AddInstruction,
}

impl ContextAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::ReportIssue => "Report Issue",
            Self::AddInstruction => "Add instruction",
        }
    }

    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::ReportIssue => None,
            Self::AddInstruction => Some("book"),
        }
    }

    fn dialog_kind(self) -> DialogKind {
        match self {
            Self::ReportIssue => DialogKind::Issue,
            Self::AddInstruction => DialogKind::Instruction,
        }
    }

    fn record_kind(self) -> RecordKind {
        match self {
            Self::ReportIssue => RecordKind::Deferred,
            Self::AddInstruction => RecordKind::Instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuEntry {
    pub action: ContextAction,
    pub name: &'static str,
    pub icon: Option<&'static str>,
}

/// Dialog opened from a context-menu entry.
///
/// The cursor placement is captured when the dialog opens, not on submit.
#[derive(Debug)]
pub struct PendingEntry {
    action: ContextAction,
    form: FormCapture,
    placement: Option<Placement>,
}

impl PendingEntry {
    pub fn action(&self) -> ContextAction {
        self.action
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn form(&self) -> &FormCapture {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormCapture {
        &mut self.form
    }
}

/// Edit dialog bound to an existing record.
#[derive(Debug)]
pub struct EditSession {
    record: Record,
    form: FormCapture,
}

impl EditSession {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn form_mut(&mut self) -> &mut FormCapture {
        &mut self.form
    }
}

pub struct SafetyWalkApp {
    ctx: PluginContext,
    config: AppConfig,
    catalog: Arc<TypeCatalog>,
    sync: Arc<ViewSynchronizer>,
    lifecycle: LifecycleCoordinator,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SafetyWalkApp {
    /// Resolves types, subscribes to host events and runs the first refresh.
    pub fn start(ctx: PluginContext, config: AppConfig) -> Result<Arc<Self>, SetupError> {
        let catalog = resolve_catalog(ctx.types.as_ref(), &config).map_err(|err| {
            error!("event=app_start module=app status=error error={err}");
            ctx.view.alert(&err.alert_message());
            err
        })?;

        let catalog = Arc::new(catalog);
        let sync = Arc::new(ViewSynchronizer::new(ctx.clone(), Arc::clone(&catalog)));
        let lifecycle = LifecycleCoordinator::new(ctx.clone(), Arc::clone(&catalog), Arc::clone(&sync));
        let app = Arc::new(Self {
            ctx,
            config,
            catalog,
            sync,
            lifecycle,
            subscriptions: Mutex::new(Vec::new()),
        });

        app.attach();
        info!(
            "event=app_start module=app status=ok locale={}",
            app.catalog.locale()
        );
        app.refresh_logged();
        Ok(app)
    }

    fn attach(self: &Arc<Self>) {
        let events = &self.ctx.events;

        let weak = Arc::downgrade(self);
        let click = events.poi_click.subscribe(move |record: &Record| {
            if let Some(app) = weak.upgrade() {
                app.handle_poi_click(record);
            }
        });

        let weak = Arc::downgrade(self);
        let save = events.poi_save.subscribe(move |record: &Record| {
            if let Some(app) = weak.upgrade() {
                app.handle_external_save(record);
            }
        });

        self.lock_subscriptions().extend([click, save]);
    }

    /// Detaches host event handlers. Idempotent.
    pub fn stop(&self) {
        let subscriptions = std::mem::take(&mut *self.lock_subscriptions());
        if subscriptions.is_empty() {
            return;
        }
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        info!("event=app_stop module=app status=ok");
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn lifecycle(&self) -> &LifecycleCoordinator {
        &self.lifecycle
    }

    pub fn refresh(&self) -> Result<RefreshOutcome, RepoError> {
        self.sync.refresh()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.sync.snapshot()
    }

    pub fn context_menu_entries(&self) -> Vec<ContextMenuEntry> {
        [ContextAction::ReportIssue, ContextAction::AddInstruction]
            .into_iter()
            .map(|action| ContextMenuEntry {
                action,
                name: action.label(),
                icon: action.icon(),
            })
            .collect()
    }

    /// Opens the dialog for `action` at the current cursor.
    pub fn begin(&self, action: ContextAction) -> PendingEntry {
        let placement = self.ctx.view.cursor_placement();
        if placement.is_none() {
            warn!(
                "event=context_entry module=app status=skip action={action:?} reason=no_cursor"
            );
        }
        let mut form = FormCapture::new(action.dialog_kind(), self.config.report_policy);
        form.open(RecordFields::default());
        PendingEntry {
            action,
            form,
            placement,
        }
    }

    /// Confirms the entry's dialog and creates the record.
    ///
    /// Returns `Ok(None)` when the dialog is no longer open.
    pub fn submit(&self, entry: &mut PendingEntry) -> LifecycleResult<Option<Record>> {
        let Some(completion) = entry.form.confirm(self.ctx.notifier.as_ref()) else {
            return Ok(None);
        };

        let point_of_view = if entry.action == ContextAction::AddInstruction
            && completion.use_current_viewpoint
        {
            self.ctx.view.current_point_of_view()
        } else {
            None
        };

        self.lifecycle
            .create_record(
                &completion.fields,
                entry.action.record_kind(),
                entry.placement.clone(),
                point_of_view,
            )
            .map(Some)
    }

    /// Shows the detail panel for deferred issues; other clicks are ignored.
    pub fn handle_poi_click(&self, record: &Record) -> Option<DetailView> {
        let is_open_issue = self.catalog.classify(&record.poi_type) == Some(RecordKind::Deferred);
        if !is_open_issue || !self.catalog.is_managed(&record.poi_type) {
            debug!(
                "event=poi_click module=app status=skip poi_id={}",
                display_id(record)
            );
            return None;
        }

        let view = &self.ctx.view;
        view.hide_detail();
        view.close_poi();
        view.close_menu();
        if let Err(err) = view.go_to_poi(record) {
            error!(
                "event=poi_navigate module=app status=error poi_id={} error={err}",
                display_id(record)
            );
        }
        Some(self.show_detail(record))
    }

    /// Refreshes after the host saved one of our records through its own flow.
    pub fn handle_external_save(&self, record: &Record) -> bool {
        if !self.catalog.is_managed(&record.poi_type) {
            return false;
        }
        debug!(
            "event=poi_external_save module=app status=ok poi_id={}",
            display_id(record)
        );
        self.ctx.view.close_poi();
        self.refresh_logged();
        true
    }

    /// Opens an issue dialog pre-filled with the record's text.
    pub fn open_edit(&self, record: &Record) -> EditSession {
        let mut form = FormCapture::new(DialogKind::Issue, self.config.report_policy);
        form.open(RecordFields::new(
            record.title.clone(),
            record.description_or_empty(),
        ));
        EditSession {
            record: record.clone(),
            form,
        }
    }

    /// Saves the edited text and re-shows the detail panel.
    pub fn submit_edit(&self, session: &mut EditSession) -> LifecycleResult<Option<DetailView>> {
        let Some(completion) = session.form.confirm(self.ctx.notifier.as_ref()) else {
            return Ok(None);
        };
        let saved = self.lifecycle.edit_record(&session.record, &completion.fields)?;
        session.record = saved.clone();
        Ok(Some(self.show_detail(&saved)))
    }

    /// Runs a detail-panel button and closes the panel.
    ///
    /// Resolve steps a reported issue through "being resolved" first, so both
    /// lifecycle notices go out.
    ///
    /// Returns the updated record, or `None` after a delete.
    pub fn apply_detail_command(
        &self,
        detail: &DetailView,
        command: DetailCommand,
    ) -> LifecycleResult<Option<Record>> {
        self.ctx.view.hide_detail();
        let record = &detail.record;
        match command {
            DetailCommand::AdvanceStatus => self.lifecycle.advance_status(record).map(Some),
            DetailCommand::Resolve => {
                let advanced = self.lifecycle.advance_status(record)?;
                self.lifecycle.resolve(&advanced).map(Some)
            }
            DetailCommand::Delete => self.lifecycle.delete_record(record).map(|()| None),
        }
    }

    fn show_detail(&self, record: &Record) -> DetailView {
        let detail = DetailView::build(record, &self.catalog, &self.config.icon_base_url);
        self.ctx.view.show_detail(&detail);
        detail
    }

    fn refresh_logged(&self) {
        if let Err(err) = self.sync.refresh() {
            error!("event=view_refresh module=app status=error error={err}");
        }
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
