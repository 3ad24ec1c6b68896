//! Core logic for the safety-walk POI plugin.
//! This crate is the single source of truth for issue lifecycle invariants.

pub mod config;
pub mod db;
pub mod form;
pub mod host;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{AppConfig, NotifierConfig, TypeNames};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use form::{DialogKind, DismissTarget, FormCapture, FormCompletion, ReportPolicy};
pub use host::events::{EventChannel, HostEvents, Subscription};
pub use host::view::{ViewError, ViewSurface};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::poi_type::{PoiType, TypeCatalog};
pub use model::record::{IssueStatus, Placement, Record, RecordFields, RecordId, RecordKind};
pub use notify::http_sink::{HttpNotificationSink, NotifyError};
pub use notify::payload::{FormReport, LifecycleNotice, NoticeKind, Notification};
pub use notify::NotificationSink;
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SqlitePoiStore};
pub use repo::type_repo::PoiTypeDirectory;
pub use service::app::{ContextAction, ContextMenuEntry, SafetyWalkApp, SetupError};
pub use service::detail::{DetailCommand, DetailView, ResolutionAction};
pub use service::lifecycle::{LifecycleCoordinator, LifecycleError, LifecycleResult};
pub use service::menu::{MenuDescriptor, MenuItem, MenuSection};
pub use service::view_sync::{RefreshOutcome, RefreshReport, ViewSnapshot, ViewSynchronizer};
pub use service::PluginContext;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
