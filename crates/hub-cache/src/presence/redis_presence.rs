//! Presence storage in Redis.
//!
//! Each channel is one hash (`<prefix>presence:<channel>`) mapping connection
//! id to a JSON-encoded entry. The hash expires after a period with no
//! submissions, which clears entries left by crashed instances.

use crate::pool::RedisPool;
use crate::pubsub::ChannelNames;
use async_trait::async_trait;
use hub_core::{HubError, HubResult, PresenceData, PresenceManager};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

fn presence_error(err: impl std::fmt::Display) -> HubError {
    HubError::Presence(err.to_string())
}

/// `PresenceManager` over Redis hashes
#[derive(Debug)]
pub struct RedisPresenceManager {
    pool: RedisPool,
    names: ChannelNames,
    ttl: Duration,
}

impl RedisPresenceManager {
    pub fn new(pool: RedisPool, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            names: ChannelNames::new(prefix),
            ttl,
        }
    }
}

#[async_trait]
impl PresenceManager for RedisPresenceManager {
    async fn submit(&self, channel: &str, connection_id: &str, data: PresenceData) -> HubResult<()> {
        let key = self.names.presence_key(channel);
        let payload = serde_json::to_string(&data)?;
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(presence_error)?;
        let mut conn = self.pool.get().await.map_err(presence_error)?;

        redis::pipe()
            .atomic()
            .hset(&key, connection_id, payload)
            .ignore()
            .expire(&key, ttl)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(presence_error)?;

        Ok(())
    }

    async fn get_presences(&self, channel: &str) -> HubResult<HashMap<String, PresenceData>> {
        let key = self.names.presence_key(channel);
        let mut conn = self.pool.get().await.map_err(presence_error)?;
        let raw: HashMap<String, String> = conn.hgetall(&key).await.map_err(presence_error)?;

        Ok(raw
            .into_iter()
            .filter_map(|(connection_id, payload)| {
                match serde_json::from_str::<PresenceData>(&payload) {
                    Ok(data) => Some((connection_id, data)),
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            connection_id = %connection_id,
                            error = %e,
                            "Skipping malformed presence entry"
                        );
                        None
                    }
                }
            })
            .collect())
    }

    async fn remove(&self, channel: &str, connection_id: &str) -> HubResult<()> {
        let key = self.names.presence_key(channel);
        let mut conn = self.pool.get().await.map_err(presence_error)?;
        conn.hdel::<_, _, ()>(&key, connection_id)
            .await
            .map_err(presence_error)?;
        Ok(())
    }

    async fn close(&self) -> HubResult<()> {
        self.pool.close();
        Ok(())
    }
}
