//! Refresh cycle that keeps host views in step with the record store.
//!
//! # Responsibility
//! - Fetch the full record set once per cycle and partition it by type.
//! - Announce un-notified deferred issues, update highlights and rebuild
//!   the three sidebar menus.
//!
//! # Invariants
//! - Partitions are disjoint and keep repository order.
//! - At most one cycle runs at a time. Triggers that arrive while a cycle is
//!   in flight are coalesced into a single follow-up cycle.
//! - Navigation and highlight rejections are logged and never abort a cycle.

use crate::model::poi_type::TypeCatalog;
use crate::model::record::{Record, RecordKind};
use crate::repo::record_repo::RepoError;
use crate::service::lifecycle::ensure_notified;
use crate::service::menu::{MenuDescriptor, MenuSection};
use crate::service::PluginContext;
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Records split by classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub deferred: Vec<Record>,
    pub resolved: Vec<Record>,
    pub instruction: Vec<Record>,
    /// Records whose type is not managed by this plugin.
    pub ignored: usize,
}

/// Splits `records` into the three managed lists, preserving input order.
pub fn partition(records: Vec<Record>, catalog: &TypeCatalog) -> Partitions {
    let mut partitions = Partitions::default();
    for record in records {
        match catalog.classify(&record.poi_type) {
            Some(RecordKind::Deferred) => partitions.deferred.push(record),
            Some(RecordKind::Resolved) => partitions.resolved.push(record),
            Some(RecordKind::Instruction) => partitions.instruction.push(record),
            None => partitions.ignored += 1,
        }
    }
    partitions
}

/// Result of one `refresh` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// Another cycle was running; it will run once more on our behalf.
    Coalesced,
}

/// Counts from the last cycle; `notified` and `cycles` accumulate across
/// coalesced follow-ups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub cycles: u32,
    pub deferred: usize,
    pub resolved: usize,
    pub instruction: usize,
    pub ignored: usize,
    pub notified: usize,
}

/// Last rendered state, kept for hosts that poll instead of listening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub partitions: Partitions,
    pub menus: Vec<MenuDescriptor>,
}

impl ViewSnapshot {
    pub fn menu(&self, section: MenuSection) -> Option<&MenuDescriptor> {
        self.menus.iter().find(|menu| menu.section == section)
    }
}

#[derive(Debug, Default)]
struct GuardState {
    running: bool,
    pending: bool,
}

pub struct ViewSynchronizer {
    ctx: PluginContext,
    catalog: Arc<TypeCatalog>,
    guard: Mutex<GuardState>,
    snapshot: Mutex<ViewSnapshot>,
}

impl ViewSynchronizer {
    pub fn new(ctx: PluginContext, catalog: Arc<TypeCatalog>) -> Self {
        Self {
            ctx,
            catalog,
            guard: Mutex::new(GuardState::default()),
            snapshot: Mutex::new(ViewSnapshot::default()),
        }
    }

    /// Runs a refresh cycle, or queues one behind the cycle in flight.
    ///
    /// Only a failed record fetch is returned as an error.
    pub fn refresh(&self) -> Result<RefreshOutcome, RepoError> {
        {
            let mut state = lock_state(&self.guard);
            if state.running {
                state.pending = true;
                debug!("event=view_refresh module=view_sync status=coalesced");
                return Ok(RefreshOutcome::Coalesced);
            }
            state.running = true;
            state.pending = false;
        }

        let mut flight = InFlight {
            guard: &self.guard,
            released: false,
        };
        let started_at = Instant::now();
        let mut report = RefreshReport::default();
        loop {
            let cycle = self.run_cycle()?;
            report = RefreshReport {
                cycles: report.cycles + 1,
                notified: report.notified + cycle.notified,
                ..cycle
            };
            if !flight.continue_if_pending() {
                break;
            }
        }

        info!(
            "event=view_refresh module=view_sync status=ok cycles={} deferred={} resolved={} instruction={} notified={} duration_ms={}",
            report.cycles,
            report.deferred,
            report.resolved,
            report.instruction,
            report.notified,
            started_at.elapsed().as_millis()
        );
        Ok(RefreshOutcome::Completed(report))
    }

    /// Copy of the state rendered by the last completed cycle.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn run_cycle(&self) -> Result<RefreshReport, RepoError> {
        let view = &self.ctx.view;
        view.refresh_pois();

        let records = self.ctx.records.find_all().map_err(|err| {
            error!("event=view_refresh module=view_sync status=error stage=fetch error={err}");
            err
        })?;
        let mut partitions = partition(records, &self.catalog);
        let notified = ensure_notified(&self.ctx, &mut partitions.deferred);

        if let Err(err) = view.highlight_pois(&partitions.deferred) {
            error!("event=view_highlight module=view_sync status=error error={err}");
        }
        if let Err(err) = view.unhighlight_pois(&partitions.resolved) {
            error!("event=view_unhighlight module=view_sync status=error error={err}");
        }

        let menus = vec![
            MenuDescriptor::build(MenuSection::DeferredIssues, &partitions.deferred),
            MenuDescriptor::build(MenuSection::ResolvedIssues, &partitions.resolved),
            MenuDescriptor::build(MenuSection::Instructions, &partitions.instruction),
        ];
        for menu in &menus {
            view.render_menu(menu);
        }

        let report = RefreshReport {
            cycles: 1,
            deferred: partitions.deferred.len(),
            resolved: partitions.resolved.len(),
            instruction: partitions.instruction.len(),
            ignored: partitions.ignored,
            notified,
        };
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) =
            ViewSnapshot { partitions, menus };
        Ok(report)
    }
}

/// Marks the guard idle when a cycle exits early or panics.
struct InFlight<'a> {
    guard: &'a Mutex<GuardState>,
    released: bool,
}

impl InFlight<'_> {
    /// Consumes a queued trigger, or releases the guard when none is queued.
    fn continue_if_pending(&mut self) -> bool {
        let mut state = lock_state(self.guard);
        if state.pending {
            state.pending = false;
            return true;
        }
        state.running = false;
        self.released = true;
        false
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.released {
            let mut state = lock_state(self.guard);
            state.running = false;
            state.pending = false;
        }
    }
}

fn lock_state(guard: &Mutex<GuardState>) -> MutexGuard<'_, GuardState> {
    guard.lock().unwrap_or_else(PoisonError::into_inner)
}
