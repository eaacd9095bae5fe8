//! # hub-store
//!
//! Storage adapters for document snapshots and operation logs.
//!
//! `MemoryAdapter` keeps everything in process. It is the default backend
//! for single-node deployments and the reference implementation of the
//! `Adapter` version-check contract.

mod memory;

pub use memory::{MemoryAdapter, StoredDocument};
