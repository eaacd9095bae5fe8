//! In-process collaborators for unit tests

use async_trait::async_trait;
use hub_cache::MemoryPresenceManager;
use hub_core::{
    Adapter, CommitHook, HubError, HubResult, Operation, OperationHandler, PresenceData,
    PresenceManager, PubSub, QueryOptions, Snapshot, Subscription,
};
use hub_store::MemoryAdapter;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared record of `close` calls across collaborators
#[derive(Debug, Clone, Default)]
pub struct CloseLog(Arc<Mutex<Vec<&'static str>>>);

impl CloseLog {
    fn push(&self, name: &'static str) {
        self.0.lock().push(name);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

/// `MemoryAdapter` that counts calls and can stall reads
#[derive(Default)]
pub struct CountingAdapter {
    inner: MemoryAdapter,
    calls: AtomicUsize,
    delay: Option<Duration>,
    close_log: Option<CloseLog>,
}

impl CountingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for CountingAdapter {
    async fn get_snapshot(
        &self,
        collection: &str,
        doc_id: &str,
        options: Option<&QueryOptions>,
    ) -> HubResult<Snapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_snapshot(collection, doc_id, options).await
    }

    async fn commit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<Snapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(collection, doc_id, op).await
    }

    async fn close(&self) -> HubResult<()> {
        if let Some(log) = &self.close_log {
            log.push("adapter");
        }
        self.inner.close().await
    }
}

/// PubSub that records every publish and delivers synchronously to
/// subscribers registered on it
#[derive(Default)]
pub struct RecordingPubSub {
    attempted: Mutex<Vec<String>>,
    published: Mutex<Vec<String>>,
    fail_on: Option<String>,
    fail_close: AtomicBool,
    handlers: Mutex<Vec<(Subscription, OperationHandler)>>,
    next_id: AtomicU64,
    close_log: Option<CloseLog>,
    delay: Option<Duration>,
}

impl RecordingPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish to `channel`
    pub fn failing_on(channel: &str) -> Self {
        Self {
            fail_on: Some(channel.to_string()),
            ..Self::default()
        }
    }

    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    /// Stall every publish call by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn attempted_channels(&self) -> Vec<String> {
        self.attempted.lock().clone()
    }

    pub fn published_channels(&self) -> Vec<String> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl PubSub for RecordingPubSub {
    async fn publish(&self, channels: &[String], op: &Operation) -> HubResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        for channel in channels {
            self.attempted.lock().push(channel.clone());
            if self.fail_on.as_deref() == Some(channel.as_str()) {
                return Err(HubError::PubSub(format!("publish to {channel} refused")));
            }
            self.published.lock().push(channel.clone());

            let targets: Vec<OperationHandler> = self
                .handlers
                .lock()
                .iter()
                .filter(|(sub, _)| sub.channel() == channel && !sub.is_cancelled())
                .map(|(_, handler)| Arc::clone(handler))
                .collect();
            for handler in targets {
                handler(op.clone()).await;
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
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let subscription = Subscription::new(id, channel, scope.child_token());
        self.handlers.lock().push((subscription.clone(), handler));
        Ok(subscription)
    }

    async fn unsubscribe(&self, channel: &str) -> HubResult<()> {
        self.handlers.lock().retain(|(sub, _)| {
            if sub.channel() == channel {
                sub.cancel();
                false
            } else {
                true
            }
        });
        Ok(())
    }

    async fn close(&self) -> HubResult<()> {
        if let Some(log) = &self.close_log {
            log.push("pubsub");
        }
        for (sub, _) in self.handlers.lock().drain(..) {
            sub.cancel();
        }
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(HubError::PubSub("close refused".to_string()));
        }
        Ok(())
    }
}

/// `MemoryPresenceManager` with switchable submit failures
#[derive(Default)]
pub struct RecordingPresence {
    inner: MemoryPresenceManager,
    fail_submits: AtomicBool,
    close_log: Option<CloseLog>,
}

impl RecordingPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    pub fn fail_submits(&self) {
        self.fail_submits.store(true, Ordering::SeqCst);
    }

    pub async fn entries(&self, channel: &str) -> HashMap<String, PresenceData> {
        self.inner.get_presences(channel).await.unwrap_or_default()
    }
}

#[async_trait]
impl PresenceManager for RecordingPresence {
    async fn submit(&self, channel: &str, connection_id: &str, data: PresenceData) -> HubResult<()> {
        if self.fail_submits.load(Ordering::SeqCst) {
            return Err(HubError::Presence("store unavailable".to_string()));
        }
        self.inner.submit(channel, connection_id, data).await
    }

    async fn get_presences(&self, channel: &str) -> HubResult<HashMap<String, PresenceData>> {
        self.inner.get_presences(channel).await
    }

    async fn remove(&self, channel: &str, connection_id: &str) -> HubResult<()> {
        self.inner.remove(channel, connection_id).await
    }

    async fn close(&self) -> HubResult<()> {
        if let Some(log) = &self.close_log {
            log.push("presence");
        }
        self.inner.close().await
    }
}

/// Commit hook that always fails
#[derive(Debug, Default)]
pub struct FailingHook {
    calls: AtomicUsize,
}

impl FailingHook {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitHook for FailingHook {
    async fn after_commit(&self, _collection: &str, _doc_id: &str, _op: &Operation) -> HubResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HubError::Internal("hook failed".to_string()))
    }
}

/// Commit hook that takes `delay` to finish
#[derive(Debug, Default)]
pub struct SlowHook {
    delay: Duration,
    finished: AtomicUsize,
}

impl SlowHook {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            finished: AtomicUsize::new(0),
        }
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitHook for SlowHook {
    async fn after_commit(&self, _collection: &str, _doc_id: &str, _op: &Operation) -> HubResult<()> {
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
