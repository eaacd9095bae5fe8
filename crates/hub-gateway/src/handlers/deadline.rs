//! Per-request deadline

use super::{HandlerError, HandlerResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Point in time a request must finish by, if any
///
/// Started once per inbound message and shared by every step that may still
/// be abandoned. Work after a successful commit never runs under it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<(Instant, Duration)>,
}

impl Deadline {
    /// Deadline `limit` from now; `None` never expires
    pub fn after(limit: Option<Duration>) -> Self {
        Self {
            at: limit.map(|limit| (Instant::now() + limit, limit)),
        }
    }

    /// Run `fut`, failing with [`HandlerError::Timeout`] once the deadline passes
    pub async fn run<T, E, F>(&self, fut: F) -> HandlerResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<HandlerError>,
    {
        match self.at {
            Some((at, limit)) => match tokio::time::timeout_at(at, fut).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(HandlerError::Timeout(limit)),
            },
            None => fut.await.map_err(Into::into),
        }
    }
}
