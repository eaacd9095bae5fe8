//! Builder for `HubService`

use super::HubService;
use crate::middleware::{Middleware, MiddlewareChain};
use hub_common::HubSettings;
use hub_core::{Adapter, CommitHook, PresenceManager, PubSub};
use std::sync::Arc;

/// Missing collaborator at build time
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Builder for creating `HubService` with custom collaborators
///
/// Middleware is appended here and frozen when the service is built.
pub struct HubServiceBuilder {
    adapter: Option<Arc<dyn Adapter>>,
    pubsub: Option<Arc<dyn PubSub>>,
    presence: Option<Arc<dyn PresenceManager>>,
    commit_hook: Option<Arc<dyn CommitHook>>,
    middleware: Vec<Arc<dyn Middleware>>,
    settings: HubSettings,
}

impl HubServiceBuilder {
    pub fn new() -> Self {
        Self {
            adapter: None,
            pubsub: None,
            presence: None,
            commit_hook: None,
            middleware: Vec::new(),
            settings: HubSettings::default(),
        }
    }

    pub fn adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn pubsub(mut self, pubsub: Arc<dyn PubSub>) -> Self {
        self.pubsub = Some(pubsub);
        self
    }

    pub fn presence(mut self, presence: Arc<dyn PresenceManager>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn commit_hook(mut self, hook: Arc<dyn CommitHook>) -> Self {
        self.commit_hook = Some(hook);
        self
    }

    /// Append a middleware; execution follows registration order
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn settings(mut self, settings: HubSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the HubService
    ///
    /// # Errors
    /// Returns `BuildError::Missing` if any required collaborator is missing
    pub fn build(self) -> Result<HubService, BuildError> {
        Ok(HubService::new(
            self.adapter.ok_or(BuildError::Missing("adapter"))?,
            self.pubsub.ok_or(BuildError::Missing("pubsub"))?,
            self.presence.ok_or(BuildError::Missing("presence"))?,
            self.commit_hook,
            MiddlewareChain::new(self.middleware),
            self.settings,
        ))
    }
}

impl Default for HubServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
