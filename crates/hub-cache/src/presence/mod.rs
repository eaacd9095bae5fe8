//! Per-document presence storage

mod memory_presence;
mod redis_presence;

pub use memory_presence::MemoryPresenceManager;
pub use redis_presence::RedisPresenceManager;
