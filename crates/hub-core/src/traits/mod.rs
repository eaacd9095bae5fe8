//! Capability traits (ports) - the collaborators the gateway depends on
//!
//! Storage, broker and presence backends live behind these traits so that the
//! gateway can run against Redis in production and in-process doubles in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::entities::{Operation, PresenceData, QueryOptions, Snapshot};
use crate::error::HubResult;

/// Future returned by an [`OperationHandler`]
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked for every operation received on a subscribed channel
pub type OperationHandler = Arc<dyn Fn(Operation) -> HandlerFuture + Send + Sync>;

// ============================================================================
// Adapter
// ============================================================================

/// Durable snapshot and operation storage
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Read the current snapshot of a document
    async fn get_snapshot(
        &self,
        collection: &str,
        doc_id: &str,
        options: Option<&QueryOptions>,
    ) -> HubResult<Snapshot>;

    /// Commit an operation, rejecting it if `op.version` is stale
    ///
    /// Returns the snapshot after the commit.
    async fn commit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<Snapshot>;

    /// Release backend resources
    async fn close(&self) -> HubResult<()>;
}

// ============================================================================
// PubSub
// ============================================================================

/// Handle to one live subscription task
///
/// Cancelling the handle stops the task. Dropping it does not.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    channel: String,
    token: CancellationToken,
}

impl Subscription {
    pub fn new(id: u64, channel: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            id,
            channel: channel.into(),
            token,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unprefixed channel name
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Token the subscription task observes
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop the subscription task
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cross-instance operation fan-out
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publish an operation to every channel
    ///
    /// A failure on one channel must not prevent delivery to the others.
    async fn publish(&self, channels: &[String], op: &Operation) -> HubResult<()>;

    /// Start a task delivering every operation on `channel` to `handler`
    ///
    /// The task ends when `scope` is cancelled, when the returned handle is
    /// cancelled, or when the channel is unsubscribed.
    async fn subscribe(
        &self,
        scope: &CancellationToken,
        channel: &str,
        handler: OperationHandler,
    ) -> HubResult<Subscription>;

    /// Stop every subscription task on `channel`
    async fn unsubscribe(&self, channel: &str) -> HubResult<()>;

    /// Stop all subscriptions and release broker resources
    async fn close(&self) -> HubResult<()>;
}

// ============================================================================
// Presence
// ============================================================================

/// Per-document presence store
#[async_trait]
pub trait PresenceManager: Send + Sync {
    /// Store or overwrite the presence of a connection on a channel
    async fn submit(&self, channel: &str, connection_id: &str, data: PresenceData) -> HubResult<()>;

    /// Every current presence on a channel, keyed by connection id
    async fn get_presences(&self, channel: &str) -> HubResult<HashMap<String, PresenceData>>;

    /// Drop the presence of a connection on a channel
    async fn remove(&self, channel: &str, connection_id: &str) -> HubResult<()>;

    /// Release backend resources
    async fn close(&self) -> HubResult<()>;
}

// ============================================================================
// Commit Hook
// ============================================================================

/// Observer notified after each successful commit
#[async_trait]
pub trait CommitHook: Send + Sync {
    async fn after_commit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_cancel() {
        let parent = CancellationToken::new();
        let sub = Subscription::new(7, "tbl1.rec1", parent.child_token());

        assert_eq!(sub.id(), 7);
        assert_eq!(sub.channel(), "tbl1.rec1");
        assert!(!sub.is_cancelled());

        let clone = sub.clone();
        clone.cancel();
        assert!(sub.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_subscription_follows_parent_scope() {
        let parent = CancellationToken::new();
        let sub = Subscription::new(1, "tbl1", parent.child_token());

        parent.cancel();
        assert!(sub.is_cancelled());
    }
}
