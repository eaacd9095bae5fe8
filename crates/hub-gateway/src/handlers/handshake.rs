//! Handshake handler (`hs`)

use crate::connection::Connection;
use hub_core::Message;

/// Answers with the protocol version and the connection's assigned id
pub struct HandshakeHandler;

impl HandshakeHandler {
    pub fn handle(connection: &Connection) -> Message {
        tracing::debug!(connection_id = %connection.id(), "Handshake");
        Message::handshake(connection.id())
    }
}
