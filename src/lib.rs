//! Order ingestion service: decomposes queued order messages into deliveries,
//! payments and items, links them from an order row, and serves point
//! lookups through a write-through entity cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
