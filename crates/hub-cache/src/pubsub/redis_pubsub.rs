//! Redis Pub/Sub backend.
//!
//! Publishing goes through the shared pool. Each subscription owns a
//! dedicated Pub/Sub connection drained by its own task, so one slow
//! handler never stalls another channel.

use crate::pool::{RedisPool, RedisPoolError};
use crate::pubsub::{ChannelNames, SubscriptionSet};
use async_trait::async_trait;
use futures_util::StreamExt;
use hub_core::{HubError, HubResult, Operation, OperationHandler, PubSub, Subscription};
use redis::AsyncCommands;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn pubsub_error(err: RedisPoolError) -> HubError {
    HubError::PubSub(err.to_string())
}

/// `PubSub` over Redis channels
pub struct RedisPubSub {
    pool: RedisPool,
    names: ChannelNames,
    subscriptions: Arc<SubscriptionSet>,
}

impl std::fmt::Debug for RedisPubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPubSub")
            .field("prefix", &self.names.prefix())
            .field("subscriptions", &self.subscriptions.total())
            .finish()
    }
}

impl RedisPubSub {
    pub fn new(pool: RedisPool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            names: ChannelNames::new(prefix),
            subscriptions: Arc::new(SubscriptionSet::new()),
        }
    }

    /// Live subscription bookkeeping
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    async fn publish(&self, channels: &[String], op: &Operation) -> HubResult<()> {
        let payload = serde_json::to_string(op)?;
        let mut conn = self.pool.get().await.map_err(pubsub_error)?;

        for channel in channels {
            let full = self.names.full(channel);
            match conn.publish::<_, _, i64>(&full, &payload).await {
                Ok(receivers) => {
                    tracing::debug!(
                        channel = %full,
                        receivers,
                        version = op.version,
                        "Published operation"
                    );
                }
                Err(e) => {
                    tracing::warn!(channel = %full, error = %e, "Failed to publish operation");
                }
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        scope: &CancellationToken,
        channel: &str,
        handler: OperationHandler,
    ) -> HubResult<Subscription> {
        let full = self.names.full(channel);

        let mut pubsub = self.pool.pubsub().await.map_err(pubsub_error)?;
        pubsub
            .subscribe(&full)
            .await
            .map_err(|e| HubError::PubSub(e.to_string()))?;

        let subscription = self.subscriptions.open(scope, channel);
        let token = subscription.token().clone();
        let subscriptions = Arc::clone(&self.subscriptions);
        let channel = channel.to_string();
        let id = subscription.id();

        tokio::spawn(async move {
            let mut stream = pubsub.into_on_message();

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    msg = stream.next() => {
                        let Some(msg) = msg else {
                            tracing::warn!(channel = %full, "Pub/Sub stream ended");
                            break;
                        };

                        let payload: String = match msg.get_payload() {
                            Ok(payload) => payload,
                            Err(e) => {
                                tracing::warn!(channel = %full, error = %e, "Unreadable Pub/Sub payload");
                                continue;
                            }
                        };

                        match serde_json::from_str::<Operation>(&payload) {
                            Ok(op) => handler(op).await,
                            Err(e) => {
                                tracing::warn!(channel = %full, error = %e, "Dropping malformed operation");
                            }
                        }
                    }
                }
            }

            subscriptions.release(&channel, id);
            tracing::debug!(channel = %full, subscription_id = id, "Subscription ended");
        });

        tracing::debug!(channel = %self.names.full(subscription.channel()), subscription_id = id, "Subscribed");
        Ok(subscription)
    }

    async fn unsubscribe(&self, channel: &str) -> HubResult<()> {
        let cancelled = self.subscriptions.cancel_channel(channel);
        tracing::debug!(channel = %self.names.full(channel), cancelled, "Unsubscribed");
        Ok(())
    }

    async fn close(&self) -> HubResult<()> {
        let cancelled = self.subscriptions.cancel_all();
        self.pool.close();
        tracing::info!(cancelled, "Redis Pub/Sub closed");
        Ok(())
    }
}
