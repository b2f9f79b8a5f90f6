//! Capability set shared by the four entity kinds.
//!
//! Stores, services and the read path are written once against [`Entity`]
//! and instantiated per kind; only the payload shape and the SQL differ.

use std::{fmt, hash::Hash};

use crate::cache::{CacheSlot, EntityCache};
use crate::domain::entities::{
    DeliveryRecord, ItemRecord, NewDelivery, NewItem, NewPayment, OrderRecord, PaymentRecord,
};
use crate::domain::types::EntityKind;
use crate::domain::validation::Validate;

pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// Creation payload accepted by the store.
    type New: Validate + fmt::Debug + Send + Sync + 'static;

    const KIND: EntityKind;

    fn key(&self) -> &Self::Key;

    /// The cache map holding this kind.
    fn slot(cache: &EntityCache) -> &CacheSlot<Self::Key, Self>;
}

impl Entity for DeliveryRecord {
    type Key = i64;
    type New = NewDelivery;

    const KIND: EntityKind = EntityKind::Delivery;

    fn key(&self) -> &i64 {
        &self.id
    }

    fn slot(cache: &EntityCache) -> &CacheSlot<i64, Self> {
        cache.deliveries()
    }
}

impl Entity for PaymentRecord {
    type Key = i64;
    type New = NewPayment;

    const KIND: EntityKind = EntityKind::Payment;

    fn key(&self) -> &i64 {
        &self.id
    }

    fn slot(cache: &EntityCache) -> &CacheSlot<i64, Self> {
        cache.payments()
    }
}

impl Entity for ItemRecord {
    type Key = i64;
    type New = NewItem;

    const KIND: EntityKind = EntityKind::Item;

    fn key(&self) -> &i64 {
        &self.id
    }

    fn slot(cache: &EntityCache) -> &CacheSlot<i64, Self> {
        cache.items()
    }
}

impl Entity for OrderRecord {
    type Key = String;
    type New = OrderRecord;

    const KIND: EntityKind = EntityKind::Order;

    fn key(&self) -> &String {
        &self.order_uid
    }

    fn slot(cache: &EntityCache) -> &CacheSlot<String, Self> {
        cache.orders()
    }
}
