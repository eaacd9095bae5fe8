//! Connection registry
//!
//! Every live connection by ID, using DashMap for thread-safe access.

use super::Connection;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tracks all registered connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a connection, returning any entry it replaced
    pub fn register(&self, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        let id = connection.id().to_string();
        let replaced = self.connections.insert(id.clone(), connection);

        tracing::debug!(connection_id = %id, "Connection registered");
        replaced
    }

    /// Remove a connection
    pub fn unregister(&self, id: &str) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(id).map(|(_, conn)| conn);
        if removed.is_some() {
            tracing::debug!(connection_id = %id, "Connection unregistered");
        }
        removed
    }

    /// Record activity on a connection; false if it is not registered
    pub fn touch(&self, id: &str) -> bool {
        match self.connections.get(id) {
            Some(conn) => {
                conn.touch();
                true
            }
            None => false,
        }
    }

    /// Get a connection by ID
    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    /// Number of registered connections
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Remove every connection idle longer than `timeout` as of `now`
    ///
    /// Removed connections are marked inactive. Their transports are left
    /// open; the socket task tears them down when the peer goes away.
    pub fn sweep_inactive(&self, now: Instant, timeout: Duration) -> Vec<Arc<Connection>> {
        let mut evicted = Vec::new();

        self.connections.retain(|_, conn| {
            if conn.idle_for(now) > timeout {
                conn.deactivate();
                evicted.push(Arc::clone(conn));
                false
            } else {
                true
            }
        });

        evicted
    }
}
