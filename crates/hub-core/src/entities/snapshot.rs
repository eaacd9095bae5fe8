//! Document snapshots

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Materialized state of a document at a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    /// Type tag; `None` when the document does not exist (never created or deleted)
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(rename = "v")]
    pub version: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Snapshot {
    /// Create a snapshot of an existing document
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, version: i64, data: Value) -> Self {
        Self {
            id: id.into(),
            type_name: Some(type_name.into()),
            version,
            data,
            meta: None,
        }
    }

    /// Create the snapshot of a document that has never been created
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: None,
            version: 0,
            data: Value::Null,
            meta: None,
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Check if the document currently exists
    pub fn exists(&self) -> bool {
        self.type_name.is_some()
    }
}

/// Snapshot query options passed through to the adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<HashMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
}
