//! In-process Pub/Sub backend for single-node deployments and tests.
//!
//! Payloads travel as JSON strings, exactly as they would through Redis.

use crate::pubsub::SubscriptionSet;
use async_trait::async_trait;
use dashmap::DashMap;
use hub_core::{HubError, HubResult, Operation, OperationHandler, PubSub, Subscription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

const CHANNEL_CAPACITY: usize = 1024;

/// `PubSub` over tokio broadcast channels
#[derive(Debug)]
pub struct MemoryPubSub {
    channels: Arc<DashMap<String, broadcast::Sender<String>>>,
    subscriptions: Arc<SubscriptionSet>,
    closed: AtomicBool,
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPubSub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            subscriptions: Arc::new(SubscriptionSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Live subscription bookkeeping
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Receiver on `channel`, creating its sender on first use
    ///
    /// Subscribes while the map entry is held so a concurrent
    /// [`prune`](Self::prune) cannot drop the sender underneath it.
    fn receiver(&self, channel: &str) -> broadcast::Receiver<String> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drop the sender of a channel nobody listens on
    fn prune(channels: &DashMap<String, broadcast::Sender<String>>, channel: &str) {
        channels.remove_if(channel, |_, tx| tx.receiver_count() == 0);
    }

    fn ensure_open(&self) -> HubResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HubError::PubSub("pub/sub is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PubSub for MemoryPubSub {
    async fn publish(&self, channels: &[String], op: &Operation) -> HubResult<()> {
        self.ensure_open()?;
        let payload = serde_json::to_string(op)?;

        for channel in channels {
            let receivers = self
                .channels
                .get(channel)
                .and_then(|tx| tx.send(payload.clone()).ok())
                .unwrap_or(0);
            tracing::debug!(channel = %channel, receivers, version = op.version, "Published operation");
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        scope: &CancellationToken,
        channel: &str,
        handler: OperationHandler,
    ) -> HubResult<Subscription> {
        self.ensure_open()?;

        let mut rx = self.receiver(channel);
        let subscription = self.subscriptions.open(scope, channel);
        let token = subscription.token().clone();
        let subscriptions = Arc::clone(&self.subscriptions);
        let channels = Arc::clone(&self.channels);
        let channel = channel.to_string();
        let id = subscription.id();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(payload) => match serde_json::from_str::<Operation>(&payload) {
                            Ok(op) => handler(op).await,
                            Err(e) => {
                                tracing::warn!(channel = %channel, error = %e, "Dropping malformed operation");
                            }
                        },
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(channel = %channel, skipped, "Subscriber lagged behind");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            drop(rx);
            subscriptions.release(&channel, id);
            MemoryPubSub::prune(&channels, &channel);
        });

        Ok(subscription)
    }

    async fn unsubscribe(&self, channel: &str) -> HubResult<()> {
        let cancelled = self.subscriptions.cancel_channel(channel);
        Self::prune(&self.channels, channel);
        tracing::debug!(channel = %channel, cancelled, "Unsubscribed");
        Ok(())
    }

    async fn close(&self) -> HubResult<()> {
        self.closed.store(true, Ordering::Release);
        let cancelled = self.subscriptions.cancel_all();
        self.channels.clear();
        tracing::info!(cancelled, "In-memory Pub/Sub closed");
        Ok(())
    }
}
