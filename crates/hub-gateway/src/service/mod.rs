//! Hub service lifecycle
//!
//! Owns the collaborators, the shared registries, and the cancellation
//! scope every background task observes.

mod builder;
mod cleanup;
mod hub_service;
mod stats;

pub use builder::{BuildError, HubServiceBuilder};
pub use cleanup::CleanupScheduler;
pub use hub_service::HubService;
pub use stats::HubStats;
