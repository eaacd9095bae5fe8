//! Gateway state
//!
//! Application state for the hub server.

use crate::service::HubService;
use hub_common::{CorsConfig, WebSocketConfig};
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    service: Arc<HubService>,
    websocket: Arc<WebSocketConfig>,
    cors: Arc<CorsConfig>,
}

impl GatewayState {
    pub fn new(service: Arc<HubService>, websocket: WebSocketConfig, cors: CorsConfig) -> Self {
        Self {
            service,
            websocket: Arc::new(websocket),
            cors: Arc::new(cors),
        }
    }

    /// Get the hub service
    pub fn service(&self) -> &Arc<HubService> {
        &self.service
    }

    /// Get the WebSocket transport limits
    pub fn websocket(&self) -> &WebSocketConfig {
        &self.websocket
    }

    /// Get the upgrade origin policy
    pub fn cors(&self) -> &CorsConfig {
        &self.cors
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("service", &self.service)
            .field("websocket", &self.websocket)
            .finish_non_exhaustive()
    }
}
