//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use super::entity::Entity;
use super::jobs::IngestOrderJob;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable storage for one entity kind.
///
/// Implementations only talk to the database; cache write-through and
/// request deadlines are layered on top by
/// [`EntityStore`](super::store::EntityStore).
#[async_trait]
pub trait EntityRepo<E: Entity>: Send + Sync {
    /// Insert a row and return it with its identifier.
    async fn insert(&self, new: E::New) -> Result<E, RepoError>;

    async fn find_by_key(&self, key: &E::Key) -> Result<Option<E>, RepoError>;

    async fn list_all(&self) -> Result<Vec<E>, RepoError>;
}

/// Publishing side of the order message channel.
#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// Enqueue one message, returning the transport-assigned job id.
    async fn publish(&self, job: IngestOrderJob) -> Result<String, RepoError>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
