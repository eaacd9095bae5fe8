//! Presence aggregation

mod aggregator;

pub use aggregator::PresenceAggregator;
