//! Presence entries

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One user's transient state (cursor, selection) on one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceData {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Unix seconds of the submission
    pub timestamp: i64,
}

impl PresenceData {
    /// Create a presence entry stamped with the current time
    pub fn new(user_id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            user_id: user_id.into(),
            data,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}
