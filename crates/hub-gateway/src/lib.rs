//! # hub-gateway
//!
//! Real-time document collaboration hub over WebSocket.
//!
//! Clients handshake, fetch snapshots, subscribe to documents or whole
//! collections, submit operations, and share presence. Submitted operations
//! are committed through an `Adapter` and fanned out over `PubSub` to every
//! subscribed connection on every instance.

pub mod connection;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod presence;
pub mod server;
pub mod service;

#[cfg(test)]
mod testing;

pub use server::{create_app, create_hub_service, run, serve, GatewayState};
pub use service::{HubService, HubServiceBuilder, HubStats};
