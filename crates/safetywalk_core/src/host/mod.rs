//! Host viewer collaborators.
//!
//! # Responsibility
//! - Describe the view/navigation surface the coordinator drives.
//! - Model host click/save hooks as explicit subscriptions.

pub mod events;
pub mod view;
