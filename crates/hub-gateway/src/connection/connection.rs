//! Individual WebSocket connection
//!
//! Represents a single client session: its identity, activity clock,
//! outbound queue, and the subscriptions and presence entries it owns.

use chrono::Utc;
use hub_core::{Message, Subscription};
use parking_lot::{Mutex, RwLock};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    id: String,

    /// Identity resolved upstream (empty when anonymous)
    user_id: String,

    /// Outbound queue drained by the connection's writer task
    sender: mpsc::Sender<Message>,

    /// Last operation sequence number assigned
    sequence: AtomicU64,

    /// Last inbound frame
    last_activity: RwLock<Instant>,

    /// Cleared on teardown or eviction
    active: AtomicBool,

    /// Subscriptions opened by this connection
    subscriptions: Mutex<Vec<Subscription>>,

    /// Channels this connection has published presence to
    presence_channels: Mutex<HashSet<String>>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: String, user_id: String, sender: mpsc::Sender<Message>) -> Arc<Self> {
        let now = Instant::now();
        Arc::new(Self {
            id,
            user_id,
            sender,
            sequence: AtomicU64::new(0),
            last_activity: RwLock::new(now),
            active: AtomicBool::new(true),
            subscriptions: Mutex::new(Vec::new()),
            presence_channels: Mutex::new(HashSet::new()),
            created_at: now,
        })
    }

    /// Generate a new connection ID (`conn_<yyyymmddHHMMSS>_<8 random>`)
    #[must_use]
    pub fn generate_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        format!("conn_{}_{suffix}", Utc::now().format("%Y%m%d%H%M%S"))
    }

    /// Get the connection ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the user ID
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record inbound activity
    pub fn touch(&self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&self, at: Instant) {
        *self.last_activity.write() = at;
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.read()
    }

    /// Time since the last inbound frame, as seen at `now`
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the connection inactive, returning whether it was active
    pub fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Remember a subscription so teardown can cancel it
    pub fn track_subscription(&self, subscription: Subscription) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|sub| !sub.is_cancelled());
        subscriptions.push(subscription);
    }

    /// Check for a live subscription on `channel`
    ///
    /// Handles cancelled elsewhere (unsubscribe, pub/sub close) are forgotten.
    pub fn is_subscribed(&self, channel: &str) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|sub| !sub.is_cancelled());
        subscriptions.iter().any(|sub| sub.channel() == channel)
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .iter()
            .filter(|sub| !sub.is_cancelled())
            .count()
    }

    /// Cancel every subscription this connection opened
    pub fn cancel_subscriptions(&self) -> usize {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        subscriptions.iter().for_each(Subscription::cancel);
        subscriptions.len()
    }

    /// Remember a presence channel so teardown can clear it
    pub fn track_presence(&self, channel: &str) {
        self.presence_channels.lock().insert(channel.to_string());
    }

    /// Take every presence channel this connection published to
    pub fn take_presence_channels(&self) -> Vec<String> {
        self.presence_channels.lock().drain().collect()
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a message for the writer task
    pub async fn send(&self, message: Message) -> Result<(), mpsc::error::SendError<Message>> {
        self.sender.send(message).await
    }

    /// Queue a message, dropping it if the connection has gone away
    pub async fn deliver(&self, message: Message) {
        if self.sender.send(message).await.is_err() {
            tracing::trace!(connection_id = %self.id, "Dropped message for closed connection");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("active", &self.is_active())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}
