//! Lifecycle use-case services.
//!
//! # Responsibility
//! - Coordinate record mutations, notifications and view refreshes.
//! - Keep host collaborators behind explicit trait objects so tests can
//!   substitute doubles.
//!
//! # Invariants
//! - Every service receives its collaborators through `PluginContext`;
//!   nothing reaches for ambient host state.

pub mod app;
pub mod detail;
pub mod lifecycle;
pub mod menu;
pub mod view_sync;

use crate::host::events::HostEvents;
use crate::host::view::ViewSurface;
use crate::notify::NotificationSink;
use crate::repo::record_repo::RecordRepository;
use crate::repo::type_repo::PoiTypeDirectory;
use std::sync::Arc;

/// Host collaborators threaded through every service.
#[derive(Clone)]
pub struct PluginContext {
    pub records: Arc<dyn RecordRepository>,
    pub types: Arc<dyn PoiTypeDirectory>,
    pub view: Arc<dyn ViewSurface>,
    pub notifier: Arc<dyn NotificationSink>,
    pub events: Arc<HostEvents>,
}
