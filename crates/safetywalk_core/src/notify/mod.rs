//! Notification sink contract and payloads.
//!
//! # Responsibility
//! - Define the one-way sink lifecycle events are reported to.
//! - Provide the HTTP outbox implementation used in production.
//!
//! # Invariants
//! - `NotificationSink::send` never blocks on delivery and never fails the
//!   caller; delivery problems are logged by the sink.

pub mod http_sink;
pub mod payload;

use payload::Notification;

/// Fire-and-forget destination for lifecycle notifications.
pub trait NotificationSink: Send + Sync {
    fn send(&self, notification: Notification);
}
