//! Repository contracts for host-owned persistence, plus a SQLite store.
//!
//! # Responsibility
//! - Define the record repository and POI type directory the coordinator
//!   depends on.
//! - Provide `SqlitePoiStore` as a local implementation of both.
//!
//! # Invariants
//! - `save` returns the persisted record as the first element.
//! - `mark_notified` is a compare-and-set; only one caller observes `true`.

pub mod record_repo;
pub mod type_repo;
