//! Operation fan-out over named channels
//!
//! Channels are either a whole collection (`tbl1`) or one document
//! (`tbl1.rec1`). Payloads are JSON-encoded `Operation`s.

mod channels;
mod memory_pubsub;
mod redis_pubsub;
mod subscriptions;

pub use channels::{ChannelNames, DEFAULT_PREFIX};
pub use memory_pubsub::MemoryPubSub;
pub use redis_pubsub::RedisPubSub;
pub use subscriptions::SubscriptionSet;
