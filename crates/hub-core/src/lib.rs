//! # hub-core
//!
//! Domain layer for the collaboration hub: the wire protocol, the document and
//! operation model, and the capability traits the gateway depends on.
//! This crate has no dependency on the transport, the broker or any storage engine.

pub mod entities;
pub mod error;
pub mod protocol;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{
    CollectionInfo, CreateData, DocumentType, OpType, Operation, PresenceData, QueryOptions,
    Snapshot,
};
pub use error::{HubError, HubResult};
pub use protocol::{Action, ErrorInfo, Message, PROTOCOL_VERSION};
pub use traits::{
    Adapter, CommitHook, HandlerFuture, OperationHandler, PresenceManager, PubSub, Subscription,
};
