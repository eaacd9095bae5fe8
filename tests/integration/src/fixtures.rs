//! Test fixtures and frame builders
//!
//! Provides reusable protocol frames for integration tests.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A record collection name unique to this test run
pub fn unique_record_collection() -> String {
    format!("rec_tbl{}", unique_suffix())
}

pub fn handshake() -> Value {
    json!({"a": "hs"})
}

pub fn fetch(collection: &str, doc_id: &str) -> Value {
    json!({"a": "f", "c": collection, "d": doc_id})
}

pub fn subscribe(collection: &str, doc_id: &str) -> Value {
    json!({"a": "s", "c": collection, "d": doc_id})
}

pub fn subscribe_collection(collection: &str) -> Value {
    json!({"a": "s", "c": collection})
}

pub fn create(collection: &str, doc_id: &str, data: Value) -> Value {
    json!({"a": "op", "c": collection, "d": doc_id, "v": 0, "create": {"type": "json0", "data": data}})
}

pub fn edit(collection: &str, doc_id: &str, version: i64, op: Value) -> Value {
    json!({"a": "op", "c": collection, "d": doc_id, "v": version, "op": op})
}

pub fn presence(collection: &str, doc_id: &str, data: Value) -> Value {
    json!({"a": "p", "c": collection, "d": doc_id, "presence": data})
}

/// `/stats` response
#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    pub connections: usize,
    pub documents: usize,
    pub timestamp: i64,
}
