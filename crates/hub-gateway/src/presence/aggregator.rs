//! Presence aggregator
//!
//! Stores a connection's latest presence on a document and returns the
//! full set for that document, ready to broadcast.

use hub_core::{HubResult, PresenceData, PresenceManager};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Merge-and-read over a `PresenceManager`
#[derive(Clone)]
pub struct PresenceAggregator {
    manager: Arc<dyn PresenceManager>,
}

impl PresenceAggregator {
    pub fn new(manager: Arc<dyn PresenceManager>) -> Self {
        Self { manager }
    }

    /// Store `data` for the connection and return every entry on the channel
    pub async fn submit(
        &self,
        channel: &str,
        connection_id: &str,
        data: PresenceData,
    ) -> HubResult<Map<String, Value>> {
        self.manager.submit(channel, connection_id, data).await?;
        self.presences(channel).await
    }

    /// Every entry on the channel, keyed by connection id
    pub async fn presences(&self, channel: &str) -> HubResult<Map<String, Value>> {
        let presences = self.manager.get_presences(channel).await?;

        let mut map = Map::with_capacity(presences.len());
        for (connection_id, data) in presences {
            map.insert(connection_id, serde_json::to_value(data)?);
        }
        Ok(map)
    }

    /// Drop a connection's entry on a channel
    pub async fn remove(&self, channel: &str, connection_id: &str) -> HubResult<()> {
        self.manager.remove(channel, connection_id).await
    }
}

impl std::fmt::Debug for PresenceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceAggregator").finish_non_exhaustive()
    }
}
