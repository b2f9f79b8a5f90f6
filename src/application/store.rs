//! Entity store: durable persistence plus cache write-through.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::cache::EntityCache;

use super::entity::Entity;
use super::repos::{EntityRepo, RepoError};

/// Store for one entity kind.
///
/// `create` writes the row, then mirrors it into the cache before returning.
/// The two writes are not atomic: a crash in between leaves the row without
/// a cache entry, which the startup preload repairs.
pub struct EntityStore<E: Entity> {
    repo: Arc<dyn EntityRepo<E>>,
    cache: Arc<EntityCache>,
    request_timeout: Duration,
}

impl<E: Entity> EntityStore<E> {
    pub fn new(
        repo: Arc<dyn EntityRepo<E>>,
        cache: Arc<EntityCache>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            cache,
            request_timeout,
        }
    }

    pub async fn create(&self, new: E::New) -> Result<E, RepoError> {
        let record = self.bounded(self.repo.insert(new)).await?;
        self.cache.put(record.clone());

        debug!(
            target = "orderflow::store",
            kind = %E::KIND,
            key = %record.key(),
            "row created and cached"
        );
        Ok(record)
    }

    /// Read straight from the durable store, bypassing the cache.
    pub async fn find_by_id(&self, key: &E::Key) -> Result<E, RepoError> {
        self.bounded(self.repo.find_by_key(key))
            .await?
            .ok_or(RepoError::NotFound)
    }

    /// Load every existing row and mirror each one into the cache.
    pub async fn preload_all(&self) -> Result<Vec<E>, RepoError> {
        let records = self.bounded(self.repo.list_all()).await?;
        for record in &records {
            self.cache.put(record.clone());
        }

        info!(
            target = "orderflow::store",
            kind = %E::KIND,
            count = records.len(),
            "preloaded rows into cache"
        );
        Ok(records)
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, RepoError>>,
    {
        tokio::time::timeout(self.request_timeout, operation)
            .await
            .map_err(|_| RepoError::Timeout)?
    }
}
