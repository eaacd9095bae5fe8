//! In-process presence storage.
//!
//! Entries live until overwritten, removed, or the store is closed.

use async_trait::async_trait;
use dashmap::DashMap;
use hub_core::{HubResult, PresenceData, PresenceManager};
use std::collections::HashMap;

/// `PresenceManager` backed by a concurrent map of channel to entries
#[derive(Debug, Default)]
pub struct MemoryPresenceManager {
    channels: DashMap<String, HashMap<String, PresenceData>>,
}

impl MemoryPresenceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels holding at least one entry
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl PresenceManager for MemoryPresenceManager {
    async fn submit(&self, channel: &str, connection_id: &str, data: PresenceData) -> HubResult<()> {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(connection_id.to_string(), data);
        Ok(())
    }

    async fn get_presences(&self, channel: &str) -> HubResult<HashMap<String, PresenceData>> {
        Ok(self
            .channels
            .get(channel)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn remove(&self, channel: &str, connection_id: &str) -> HubResult<()> {
        if let Some(mut entries) = self.channels.get_mut(channel) {
            entries.remove(connection_id);
        }
        self.channels.remove_if(channel, |_, entries| entries.is_empty());
        Ok(())
    }

    async fn close(&self) -> HubResult<()> {
        self.channels.clear();
        Ok(())
    }
}
