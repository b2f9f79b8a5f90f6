//! Process-local entity cache.
//!
//! One unbounded map per entity kind, each behind its own lock:
//!
//! - **deliveries / payments / items**: keyed by the store-generated `i64` id
//! - **orders**: keyed by the caller-supplied order UID
//!
//! Entries are written by every successful store create and by the startup
//! preload. Nothing is ever evicted or invalidated; entities are immutable
//! once created, so the cache stays a mirror of the store for the lifetime
//! of the process.

mod lock;
mod store;

pub use store::{CacheSlot, EntityCache};
