//! Live subscription bookkeeping shared by the broker backends.

use dashmap::DashMap;
use hub_core::Subscription;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Every live subscription task, grouped by unprefixed channel
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    next_id: AtomicU64,
    by_channel: DashMap<String, Vec<Subscription>>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription whose token is a child of `scope`
    pub fn open(&self, scope: &CancellationToken, channel: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let subscription = Subscription::new(id, channel, scope.child_token());
        self.by_channel
            .entry(channel.to_string())
            .or_default()
            .push(subscription.clone());
        subscription
    }

    /// Forget a subscription whose task has ended
    pub fn release(&self, channel: &str, id: u64) {
        if let Some(mut subs) = self.by_channel.get_mut(channel) {
            subs.retain(|s| s.id() != id);
        }
        self.by_channel.remove_if(channel, |_, subs| subs.is_empty());
    }

    /// Cancel every subscription on a channel, returning how many were live
    pub fn cancel_channel(&self, channel: &str) -> usize {
        match self.by_channel.remove(channel) {
            Some((_, subs)) => {
                subs.iter().for_each(Subscription::cancel);
                subs.len()
            }
            None => 0,
        }
    }

    /// Cancel every subscription, returning how many were live
    pub fn cancel_all(&self) -> usize {
        let channels: Vec<String> = self.by_channel.iter().map(|e| e.key().clone()).collect();
        channels.iter().map(|c| self.cancel_channel(c)).sum()
    }

    /// Number of live subscriptions on a channel
    pub fn count(&self, channel: &str) -> usize {
        self.by_channel.get(channel).map_or(0, |subs| subs.len())
    }

    /// Number of live subscriptions across all channels
    pub fn total(&self) -> usize {
        self.by_channel.iter().map(|e| e.value().len()).sum()
    }
}
