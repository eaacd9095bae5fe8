//! Hub service
//!
//! The protocol engine: accepts connections, routes their messages through
//! middleware and handlers, and releases everything a connection held when
//! it goes away.

use super::{CleanupScheduler, HubServiceBuilder, HubStats};
use crate::connection::{Connection, ConnectionRegistry};
use crate::handlers::{Deadline, HandlerError, HandlerResult, MessageDispatcher};
use crate::middleware::MiddlewareChain;
use crate::pipeline::{DocumentRegistry, OperationPipeline};
use crate::presence::PresenceAggregator;
use hub_common::HubSettings;
use hub_core::{Adapter, CommitHook, Message, PresenceManager, PubSub};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Collaboration hub service
///
/// Every background task spawned on behalf of the service (subscriptions,
/// the cleanup scheduler) observes [`scope`](Self::scope), so a single
/// cancellation on shutdown stops them all.
pub struct HubService {
    registry: Arc<ConnectionRegistry>,
    documents: Arc<DocumentRegistry>,
    adapter: Arc<dyn Adapter>,
    pubsub: Arc<dyn PubSub>,
    presence_manager: Arc<dyn PresenceManager>,
    presence: PresenceAggregator,
    pipeline: OperationPipeline,
    middleware: MiddlewareChain,
    settings: HubSettings,
    scope: CancellationToken,
    cleanup: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl HubService {
    pub(super) fn new(
        adapter: Arc<dyn Adapter>,
        pubsub: Arc<dyn PubSub>,
        presence_manager: Arc<dyn PresenceManager>,
        commit_hook: Option<Arc<dyn CommitHook>>,
        middleware: MiddlewareChain,
        settings: HubSettings,
    ) -> Self {
        let documents = Arc::new(DocumentRegistry::new());
        let pipeline = OperationPipeline::new(
            Arc::clone(&adapter),
            Arc::clone(&pubsub),
            Arc::clone(&documents),
            commit_hook,
        );

        Self {
            registry: ConnectionRegistry::new_shared(),
            documents,
            presence: PresenceAggregator::new(Arc::clone(&presence_manager)),
            adapter,
            pubsub,
            presence_manager,
            pipeline,
            middleware,
            settings,
            scope: CancellationToken::new(),
            cleanup: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn builder() -> HubServiceBuilder {
        HubServiceBuilder::new()
    }

    // === Accessors ===

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn pubsub(&self) -> &dyn PubSub {
        self.pubsub.as_ref()
    }

    pub fn presence(&self) -> &PresenceAggregator {
        &self.presence
    }

    pub fn pipeline(&self) -> &OperationPipeline {
        &self.pipeline
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Root cancellation scope of the service
    pub fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    // === Lifecycle ===

    /// Start background tasks
    ///
    /// Calling this more than once has no effect.
    pub fn start(&self) {
        let mut cleanup = self.cleanup.lock();
        if cleanup.is_some() || self.is_shut_down() {
            return;
        }

        let scheduler = CleanupScheduler::new(
            Arc::clone(&self.registry),
            self.settings.cleanup_interval(),
            self.settings.inactivity_timeout(),
        );
        tracing::info!(
            interval_secs = scheduler.interval().as_secs(),
            timeout_secs = self.settings.inactivity_timeout().as_secs(),
            "Cleanup scheduler started"
        );
        *cleanup = Some(scheduler.spawn(self.scope.clone()));
    }

    /// Stop background tasks and close collaborators
    ///
    /// Cancels the scope first, then closes the adapter, the pubsub and the
    /// presence manager in that order. Close failures are logged and do not
    /// stop the remaining steps. Only the first call does anything.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::info!(
            connections = self.registry.count(),
            "Shutting down hub service"
        );
        self.scope.cancel();

        let cleanup = self.cleanup.lock().take();
        if let Some(handle) = cleanup {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cleanup scheduler ended abnormally");
            }
        }

        if let Err(e) = self.adapter.close().await {
            tracing::error!(error = %e, "Failed to close adapter");
        }
        if let Err(e) = self.pubsub.close().await {
            tracing::error!(error = %e, "Failed to close pubsub");
        }
        if let Err(e) = self.presence_manager.close().await {
            tracing::error!(error = %e, "Failed to close presence manager");
        }

        tracing::info!("Hub service stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    // === Connections ===

    /// Register a new connection whose outbound frames go to `sender`
    pub fn connect(&self, user_id: impl Into<String>, sender: mpsc::Sender<Message>) -> Arc<Connection> {
        let connection = Connection::new(Connection::generate_id(), user_id.into(), sender);
        self.registry.register(Arc::clone(&connection));

        tracing::info!(
            connection_id = %connection.id(),
            user_id = %connection.user_id(),
            connections = self.registry.count(),
            "Connection registered"
        );

        connection
    }

    /// Handle one decoded inbound message
    ///
    /// The response (or the error frame) is queued on the connection. An
    /// error is returned only when the connection can no longer be written.
    pub async fn handle_message(&self, connection: &Arc<Connection>, message: Message) -> HandlerResult<()> {
        tracing::trace!(
            connection_id = %connection.id(),
            message = %message,
            "Received message"
        );

        let deadline = Deadline::after(self.settings.handler_timeout());
        let result = MessageDispatcher::dispatch(self, connection, &message, deadline).await;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                let Some(info) = e.to_error_info() else {
                    return Err(e);
                };
                if info.code >= 500 {
                    tracing::warn!(
                        connection_id = %connection.id(),
                        action = %message.action,
                        code = info.code,
                        error = %e,
                        "Handler error"
                    );
                } else {
                    tracing::debug!(
                        connection_id = %connection.id(),
                        action = %message.action,
                        code = info.code,
                        error = %e,
                        "Request rejected"
                    );
                }
                Message::error_reply(&message, info)
            }
        };

        connection
            .send(reply)
            .await
            .map_err(|_| HandlerError::ConnectionClosed)
    }

    /// Release everything the connection holds
    ///
    /// Safe to call for a connection the cleanup scheduler already evicted.
    pub async fn disconnect(&self, connection: &Connection) {
        connection.deactivate();
        self.registry.unregister(connection.id());

        let subscriptions = connection.cancel_subscriptions();

        for channel in connection.take_presence_channels() {
            if let Err(e) = self.presence.remove(&channel, connection.id()).await {
                tracing::warn!(
                    connection_id = %connection.id(),
                    channel = %channel,
                    error = %e,
                    "Failed to remove presence"
                );
            }
        }

        tracing::info!(
            connection_id = %connection.id(),
            subscriptions,
            duration_secs = connection.age().as_secs(),
            "Connection closed"
        );
    }

    /// Current connection and document counts
    pub fn stats(&self) -> HubStats {
        HubStats::now(self.registry.count(), self.documents.count())
    }
}

impl std::fmt::Debug for HubService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubService")
            .field("connections", &self.registry.count())
            .field("documents", &self.documents.count())
            .field("middleware", &self.middleware)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
