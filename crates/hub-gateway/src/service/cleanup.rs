//! Cleanup scheduler
//!
//! Periodically evicts connections that have been silent longer than the
//! inactivity timeout. Eviction only removes the registry entry; the
//! transport is closed by its own task.

use crate::connection::ConnectionRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest accepted sweep period
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Periodic inactive-connection sweep
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    timeout: Duration,
}

impl CleanupScheduler {
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration, timeout: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(MIN_INTERVAL),
            timeout,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep now
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Run one sweep as of `now`
    pub fn sweep_at(&self, now: Instant) -> usize {
        let evicted = self.registry.sweep_inactive(now, self.timeout);

        for conn in &evicted {
            tracing::info!(
                connection_id = %conn.id(),
                idle_secs = conn.idle_for(now).as_secs(),
                "Cleaned up inactive connection"
            );
        }

        evicted.len()
    }

    /// Sweep on every tick until `scope` is cancelled
    pub async fn run(self, scope: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                () = scope.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = self.sweep();
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            remaining = self.registry.count(),
                            "Cleanup sweep finished"
                        );
                    }
                }
            }
        }

        tracing::debug!("Cleanup scheduler stopped");
    }

    /// Spawn [`run`](Self::run) on the runtime
    pub fn spawn(self, scope: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(scope))
    }
}
