//! Per-kind entity services.
//!
//! A service validates a creation payload, delegates to its
//! [`EntityStore`] and translates storage failures into [`EntityError`].
//! One generic implementation backs all four kinds.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::domain::entities::{DeliveryRecord, ItemRecord, NewItem, OrderRecord, PaymentRecord};
use crate::domain::error::DomainError;
use crate::domain::types::EntityKind;
use crate::domain::validation::Validate;

use super::entity::Entity;
use super::repos::RepoError;
use super::store::EntityStore;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("{kind} `{key}` not found")]
    NotFound { kind: EntityKind, key: String },
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error("{kind} store failed")]
    Store {
        kind: EntityKind,
        #[source]
        source: RepoError,
    },
}

impl EntityError {
    /// Every storage failure other than a missing row is a store error,
    /// constraint violations included.
    fn store(kind: EntityKind, source: RepoError) -> Self {
        Self::Store { kind, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Store {
                source: RepoError::Timeout,
                ..
            }
        )
    }
}

/// Partial failure of [`EntityService::create_batch`].
///
/// `created` holds the identifiers persisted before the failing element, in
/// input order.
#[derive(Debug, Error)]
#[error("batch create failed at element {index}")]
pub struct BatchError<K: std::fmt::Debug> {
    pub index: usize,
    pub created: Vec<K>,
    #[source]
    pub source: EntityError,
}

pub struct EntityService<E: Entity> {
    store: Arc<EntityStore<E>>,
}

pub type DeliveryService = EntityService<DeliveryRecord>;
pub type PaymentService = EntityService<PaymentRecord>;
pub type ItemService = EntityService<ItemRecord>;
pub type OrderService = EntityService<OrderRecord>;

impl<E: Entity> EntityService<E> {
    pub fn new(store: Arc<EntityStore<E>>) -> Self {
        Self { store }
    }

    /// Validate and persist one payload, returning the stored record.
    pub async fn create(&self, new: E::New) -> Result<E, EntityError> {
        new.validate()?;
        self.store
            .create(new)
            .await
            .map_err(|err| EntityError::store(E::KIND, err))
    }

    /// Authoritative read from the durable store.
    pub async fn get_by_id(&self, key: &E::Key) -> Result<E, EntityError> {
        match self.store.find_by_id(key).await {
            Ok(record) => Ok(record),
            Err(RepoError::NotFound) => Err(EntityError::NotFound {
                kind: E::KIND,
                key: key.to_string(),
            }),
            Err(err) => Err(EntityError::store(E::KIND, err)),
        }
    }

    /// Fill the cache from the store; returns the number of records loaded.
    pub async fn preload(&self) -> Result<usize, EntityError> {
        self.store
            .preload_all()
            .await
            .map(|records| records.len())
            .map_err(|err| EntityError::store(E::KIND, err))
    }
}

impl ItemService {
    /// Create items one at a time in input order, stopping at the first
    /// failure. Items created before the failure stay persisted.
    pub async fn create_batch(&self, items: Vec<NewItem>) -> Result<Vec<i64>, BatchError<i64>> {
        let mut created = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.create(item).await {
                Ok(record) => created.push(record.id),
                Err(source) => {
                    warn!(
                        target = "orderflow::service::items",
                        index,
                        created = created.len(),
                        error = %source,
                        "item batch aborted"
                    );
                    return Err(BatchError {
                        index,
                        created,
                        source,
                    });
                }
            }
        }
        Ok(created)
    }
}
