//! Read path for point lookups.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::EntityCache;

use super::entity::Entity;
use super::service::{EntityError, EntityService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Cache,
    Store,
}

impl LookupSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Store => "store",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<E> {
    pub record: E,
    pub source: LookupSource,
}

/// Cache-first reader for one kind.
///
/// A miss falls through to the entity service. With `backfill_on_miss` the
/// record found in the store is also written to the cache; otherwise the
/// cache only ever holds what ingestion or preload put there.
pub struct LookupService<E: Entity> {
    cache: Arc<EntityCache>,
    service: Arc<EntityService<E>>,
    backfill_on_miss: bool,
}

impl<E: Entity> LookupService<E> {
    pub fn new(
        cache: Arc<EntityCache>,
        service: Arc<EntityService<E>>,
        backfill_on_miss: bool,
    ) -> Self {
        Self {
            cache,
            service,
            backfill_on_miss,
        }
    }

    pub async fn get(&self, key: &E::Key) -> Result<Lookup<E>, EntityError> {
        if let Some(record) = self.cache.get::<E>(key) {
            return Ok(Lookup {
                record,
                source: LookupSource::Cache,
            });
        }

        let record = self.service.get_by_id(key).await?;
        if self.backfill_on_miss {
            self.cache.put(record.clone());
        }

        debug!(
            target = "orderflow::lookup",
            kind = %E::KIND,
            key = %key,
            backfilled = self.backfill_on_miss,
            "cache miss served from store"
        );

        Ok(Lookup {
            record,
            source: LookupSource::Store,
        })
    }
}
