//! Hub server setup
//!
//! Provides the WebSocket endpoint, health and stats routes, and the
//! wiring from configuration to a running `HubService`.

mod handler;
mod state;

pub use handler::{socket_handler, ConnectParams, USER_ID_HEADER};
pub use state::GatewayState;

use crate::middleware::RecordOnlySubmit;
use crate::pipeline::TracingCommitHook;
use crate::service::{HubService, HubStats};
use axum::{extract::State, routing::get, Json, Router};
use hub_cache::{MemoryPresenceManager, MemoryPubSub, RedisPool, RedisPresenceManager, RedisPubSub};
use hub_common::{AppConfig, AppError};
use hub_core::{PresenceManager, PubSub};
use hub_store::MemoryAdapter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Create the hub router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/socket", get(socket_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Connection and document counters
async fn stats(State(state): State<GatewayState>) -> Json<HubStats> {
    Json(state.service().stats())
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize collaborators and build the `HubService`
///
/// Uses Redis for pub/sub and presence when `REDIS_URL` is configured and
/// in-process backends otherwise.
pub async fn create_hub_service(config: &AppConfig) -> Result<HubService, AppError> {
    let prefix = &config.hub.pubsub_prefix;

    let (pubsub, presence): (Arc<dyn PubSub>, Arc<dyn PresenceManager>) = match &config.redis {
        Some(redis) => {
            tracing::info!("Connecting to Redis...");
            let pool = RedisPool::from_config(redis).map_err(|e| AppError::Cache(e.to_string()))?;
            pool.health_check()
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
            tracing::info!("Redis connection established");

            (
                Arc::new(RedisPubSub::new(pool.clone(), prefix)),
                Arc::new(RedisPresenceManager::new(pool, prefix, config.hub.presence_ttl())),
            )
        }
        None => {
            tracing::info!("REDIS_URL not set, using in-process pub/sub and presence");
            (
                Arc::new(MemoryPubSub::new()),
                Arc::new(MemoryPresenceManager::new()),
            )
        }
    };

    HubService::builder()
        .adapter(Arc::new(MemoryAdapter::new()))
        .pubsub(pubsub)
        .presence(presence)
        .middleware(Arc::new(RecordOnlySubmit))
        .commit_hook(Arc::new(TracingCommitHook))
        .settings(config.hub.clone())
        .build()
        .map_err(|e| AppError::Internal(e.into()))
}

/// Serve on an already bound listener until a shutdown signal or until
/// the service scope is cancelled, then shut the service down
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<(), AppError> {
    let service = Arc::clone(state.service());
    let addr = listener.local_addr()?;
    tracing::info!("Hub listening on ws://{}/socket", addr);

    service.start();

    let scope = service.scope().clone();
    let result = axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal(scope))
        .await;

    service.shutdown().await;
    result.map_err(|e| AppError::Server(e.to_string()))
}

/// Resolve on SIGINT, SIGTERM or when `scope` is cancelled; cancel `scope`
/// either way
async fn shutdown_signal(scope: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Interrupt received, shutting down");
        }
        () = terminate() => {
            tracing::info!("SIGTERM received, shutting down");
        }
        () = scope.cancelled() => {}
    }
    // Open sockets observe the scope and close before the server drains
    scope.cancel();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Run the hub server
pub async fn run_server(state: GatewayState, addr: &str) -> Result<(), AppError> {
    tracing::info!("Starting hub server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, state).await
}

/// Run the complete hub server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let service = Arc::new(create_hub_service(&config).await?);
    let state = GatewayState::new(service, config.websocket.clone(), config.cors.clone());

    run_server(state, &config.gateway.address()).await
}
