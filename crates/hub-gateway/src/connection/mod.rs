//! Connection management
//!
//! Tracks live WebSocket connections and the resources each one holds.

mod connection;
mod registry;

pub use connection::Connection;
pub use registry::ConnectionRegistry;
