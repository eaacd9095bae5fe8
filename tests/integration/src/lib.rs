//! Integration test utilities for the collaboration hub
//!
//! This crate provides helpers for running end-to-end tests against the
//! WebSocket endpoint and the HTTP routes.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
