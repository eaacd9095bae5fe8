//! Middleware trait and ordered chain

use crate::connection::Connection;
use async_trait::async_trait;
use hub_core::{HubResult, Message};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A validator or observer invoked before protocol dispatch
///
/// Implementations must not change any state when they reject a message.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        scope: &CancellationToken,
        connection: &Connection,
        message: &Message,
    ) -> HubResult<()>;
}

/// Immutable, ordered list of middleware
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middleware: Arc<[Arc<dyn Middleware>]>,
}

impl MiddlewareChain {
    #[must_use]
    pub fn new(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middleware: middleware.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Run every middleware in order, stopping at the first rejection
    pub async fn run(
        &self,
        scope: &CancellationToken,
        connection: &Connection,
        message: &Message,
    ) -> HubResult<()> {
        for middleware in self.middleware.iter() {
            middleware.handle(scope, connection, message).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
