//! Service statistics

use serde::Serialize;

/// Point-in-time counters served at `/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub connections: usize,
    pub documents: usize,
    /// Unix seconds
    pub timestamp: i64,
}

impl HubStats {
    pub fn now(connections: usize, documents: usize) -> Self {
        Self {
            connections,
            documents,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
