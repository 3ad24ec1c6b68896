//! Domain model for point-of-interest records.
//!
//! # Responsibility
//! - Define the canonical record shape shared by lifecycle and view code.
//! - Centralize issue status codes and their legal transitions.
//!
//! # Invariants
//! - Record identity is assigned by persistence, never by the coordinator.
//! - Status only moves forward: Reported -> BeingResolved -> Resolved.
//! - Placement fields are opaque pass-through owned by the host viewer.

pub mod poi_type;
pub mod record;
