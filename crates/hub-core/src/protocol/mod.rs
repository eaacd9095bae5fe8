//! Wire protocol definitions
//!
//! Defines the action codes and the frame format exchanged over the socket.

mod action;
mod message;

pub use action::Action;
pub use message::{ErrorInfo, Message};

/// Protocol version announced in the handshake response
pub const PROTOCOL_VERSION: &str = "1.0.0";
