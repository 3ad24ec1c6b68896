//! Host event channels with explicit subscription handles.
//!
//! # Responsibility
//! - Let the host (or a test) emit POI click/save events.
//! - Hand subscribers a `Subscription` that detaches the handler.
//!
//! # Invariants
//! - A handler never runs after its subscription is unsubscribed or dropped.
//! - Handlers run without the registry lock held, so they may subscribe,
//!   unsubscribe or emit re-entrantly.

use crate::model::record::Record;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;
type HandlerMap<E> = Mutex<BTreeMap<u64, Handler<E>>>;

/// Multi-subscriber channel for one host event type.
pub struct EventChannel<E> {
    handlers: Arc<HandlerMap<E>>,
    next_id: AtomicU64,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E: 'static> EventChannel<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` until the returned subscription is released.
    pub fn subscribe(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.insert(id, Arc::new(handler));
        }

        let weak: Weak<HandlerMap<E>> = Arc::downgrade(&self.handlers);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(handlers) = weak.upgrade() {
                    if let Ok(mut handlers) = handlers.lock() {
                        handlers.remove(&id);
                    }
                }
            })),
        }
    }

    /// Delivers `event` to every current subscriber in subscription order.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = match self.handlers.lock() {
            Ok(handlers) => handlers.values().cloned().collect(),
            Err(_) => return 0,
        };
        for handler in &snapshot {
            handler(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }
}

/// Handle returned by `EventChannel::subscribe`.
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Detaches the handler now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// Event hooks exposed by the host POI service.
#[derive(Default)]
pub struct HostEvents {
    pub poi_click: EventChannel<Record>,
    pub poi_save: EventChannel<Record>,
}

impl HostEvents {
    pub fn new() -> Self {
        Self::default()
    }
}
