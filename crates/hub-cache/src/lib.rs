//! # hub-cache
//!
//! Broker layer for operation fan-out and presence.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Operation fan-out across server instances (`RedisPubSub`),
//!   or within one process (`MemoryPubSub`)
//! - **Presence**: Per-document presence maps in Redis hashes or in memory
//!
//! ## Example
//!
//! ```ignore
//! use hub_cache::{RedisPool, RedisPoolConfig, RedisPubSub, RedisPresenceManager};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let pubsub = RedisPubSub::new(pool.clone(), "sharedb:");
//! let presence = RedisPresenceManager::new(pool, "sharedb:", Duration::from_secs(300));
//!
//! pubsub.subscribe(&scope, "tbl1.rec1", handler).await?;
//! pubsub.publish(&op.channels(), &op).await?;
//! ```

pub mod pool;
pub mod presence;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export presence types
pub use presence::{MemoryPresenceManager, RedisPresenceManager};

// Re-export pubsub types
pub use pubsub::{ChannelNames, MemoryPubSub, RedisPubSub, SubscriptionSet};
