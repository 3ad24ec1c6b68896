#![allow(dead_code)]

use safetywalk_core::{
    AppConfig, DetailView, HostEvents, MenuDescriptor, Notification, NotificationSink, Placement,
    PluginContext, PoiType, PoiTypeDirectory, Record, RecordId, RecordRepository, RepoError,
    RepoResult, ViewError, ViewSurface,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const DEFERRED_ID: &str = "type-deferred";
pub const RESOLVED_ID: &str = "type-resolved";
pub const INSTRUCTION_ID: &str = "type-instruction";

pub fn deferred_type() -> PoiType {
    PoiType::new(DEFERRED_ID, "Maintenance Deferred")
}

pub fn resolved_type() -> PoiType {
    PoiType::new(RESOLVED_ID, "Maintenance Resolved")
}

pub fn instruction_type() -> PoiType {
    PoiType::new(INSTRUCTION_ID, "Instruction")
}

pub fn managed_types() -> Vec<PoiType> {
    vec![deferred_type(), resolved_type(), instruction_type()]
}

/// In-memory record repository with failure switches.
#[derive(Default)]
pub struct MemoryRecords {
    records: Mutex<Vec<Record>>,
    pub fail_saves: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub find_all_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
}

impl MemoryRecords {
    /// Stores `record` directly, assigning an id when missing.
    pub fn seed(&self, mut record: Record) -> Record {
        record.id.get_or_insert_with(Uuid::new_v4);
        self.records.lock().unwrap().push(record.clone());
        record
    }

    pub fn all(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.all().into_iter().find(|record| record.id == Some(id))
    }
}

impl RecordRepository for MemoryRecords {
    fn save(&self, record: &Record) -> RepoResult<Vec<Record>> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Rejected("save refused".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let mut saved = record.clone();
        match saved.id {
            Some(id) => {
                let slot = records
                    .iter_mut()
                    .find(|existing| existing.id == Some(id))
                    .ok_or(RepoError::NotFound(id))?;
                saved.notified |= slot.notified;
                *slot = saved.clone();
            }
            None => {
                saved.id = Some(Uuid::new_v4());
                records.push(saved.clone());
            }
        }
        Ok(vec![saved])
    }

    fn remove(&self, record: &Record) -> RepoResult<()> {
        let id = record.id.ok_or(RepoError::Unsaved)?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|existing| existing.id != Some(id));
        if records.len() == before {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_all(&self) -> RepoResult<Vec<Record>> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RepoError::Rejected("fetch refused".to_string()));
        }
        Ok(self.all())
    }

    fn mark_notified(&self, id: RecordId) -> RepoResult<bool> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|existing| existing.id == Some(id))
            .ok_or(RepoError::NotFound(id))?;
        if record.notified {
            return Ok(false);
        }
        record.notified = true;
        Ok(true)
    }
}

pub struct StaticTypes {
    pub types: Vec<PoiType>,
    pub fail: bool,
}

impl PoiTypeDirectory for StaticTypes {
    fn find_all(&self) -> RepoResult<Vec<PoiType>> {
        if self.fail {
            return Err(RepoError::Rejected("directory offline".to_string()));
        }
        Ok(self.types.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.sent().iter().map(Notification::label).collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.labels().into_iter().filter(|l| *l == label).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

type RefreshHook = Box<dyn FnOnce() + Send>;

/// View double that records every host call as a short string.
#[derive(Default)]
pub struct RecordingView {
    calls: Mutex<Vec<String>>,
    menus: Mutex<Vec<MenuDescriptor>>,
    details: Mutex<Vec<DetailView>>,
    alerts: Mutex<Vec<String>>,
    highlighted: Mutex<Vec<Vec<String>>>,
    pub fail_navigation: AtomicBool,
    pub cursor: Mutex<Option<Placement>>,
    pub point_of_view: Mutex<Option<Placement>>,
    refresh_hook: Mutex<Option<RefreshHook>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Menus rendered by the most recent refresh cycle.
    pub fn last_menus(&self) -> Vec<MenuDescriptor> {
        let menus = self.menus.lock().unwrap();
        let start = menus.len().saturating_sub(3);
        menus[start..].to_vec()
    }

    pub fn details(&self) -> Vec<DetailView> {
        self.details.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    /// Titles passed to the most recent `highlight_pois` call.
    pub fn last_highlighted(&self) -> Vec<String> {
        self.highlighted
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Runs `hook` inside the next `refresh_pois` call.
    pub fn on_next_refresh(&self, hook: impl FnOnce() + Send + 'static) {
        *self.refresh_hook.lock().unwrap() = Some(Box::new(hook));
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ViewSurface for RecordingView {
    fn go_to_poi(&self, record: &Record) -> Result<(), ViewError> {
        self.record(format!("go_to:{}", record.title));
        if self.fail_navigation.load(Ordering::SeqCst) {
            return Err(ViewError::Rejected("camera busy".to_string()));
        }
        Ok(())
    }

    fn highlight_pois(&self, records: &[Record]) -> Result<(), ViewError> {
        self.record(format!("highlight:{}", records.len()));
        self.highlighted
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.title.clone()).collect());
        Ok(())
    }

    fn unhighlight_pois(&self, records: &[Record]) -> Result<(), ViewError> {
        self.record(format!("unhighlight:{}", records.len()));
        Ok(())
    }

    fn close_poi(&self) {
        self.record("close_poi".to_string());
    }

    fn close_menu(&self) {
        self.record("close_menu".to_string());
    }

    fn refresh_pois(&self) {
        self.record("refresh_pois".to_string());
        let hook = self.refresh_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn render_menu(&self, menu: &MenuDescriptor) {
        self.record(format!("render_menu:{}", menu.title));
        self.menus.lock().unwrap().push(menu.clone());
    }

    fn show_detail(&self, detail: &DetailView) {
        self.record(format!("show_detail:{}", detail.title));
        self.details.lock().unwrap().push(detail.clone());
    }

    fn hide_detail(&self) {
        self.record("hide_detail".to_string());
    }

    fn cursor_placement(&self) -> Option<Placement> {
        self.cursor.lock().unwrap().clone()
    }

    fn current_point_of_view(&self) -> Option<Placement> {
        self.point_of_view.lock().unwrap().clone()
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub struct Harness {
    pub records: Arc<MemoryRecords>,
    pub view: Arc<RecordingView>,
    pub sink: Arc<RecordingSink>,
    pub events: Arc<HostEvents>,
    pub ctx: PluginContext,
}

pub fn harness_with_types(types: StaticTypes) -> Harness {
    let records = Arc::new(MemoryRecords::default());
    let view = Arc::new(RecordingView::default());
    let sink = Arc::new(RecordingSink::default());
    let events = Arc::new(HostEvents::new());
    let ctx = PluginContext {
        records: records.clone(),
        types: Arc::new(types),
        view: view.clone(),
        notifier: sink.clone(),
        events: events.clone(),
    };
    Harness {
        records,
        view,
        sink,
        events,
        ctx,
    }
}

pub fn harness() -> Harness {
    harness_with_types(StaticTypes {
        types: managed_types(),
        fail: false,
    })
}

pub fn config() -> AppConfig {
    AppConfig::default()
}
