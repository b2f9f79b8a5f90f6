//! Application layer: per-kind stores and services, the read path and the
//! ingestion pipeline.

pub mod entity;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod lookup;
pub mod repos;
pub mod service;
pub mod store;
