//! Cache storage: four independent keyed maps.

use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    sync::RwLock,
};

use metrics::{counter, gauge};

use crate::application::entity::Entity;
use crate::domain::entities::{DeliveryRecord, ItemRecord, OrderRecord, PaymentRecord};
use crate::domain::types::EntityKind;

use super::lock;

const METRIC_CACHE_HIT: &str = "orderflow_cache_hit_total";
const METRIC_CACHE_MISS: &str = "orderflow_cache_miss_total";
const METRIC_CACHE_ENTRIES: &str = "orderflow_cache_entries";

/// A single kind's key space.
///
/// Readers and writers are serialized by one `RwLock`; kinds never share a
/// lock because their keys never alias.
pub struct CacheSlot<K, V> {
    kind: EntityKind,
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> CacheSlot<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let found = lock::read(&self.entries, self.kind).get(key).cloned();
        let metric = if found.is_some() {
            METRIC_CACHE_HIT
        } else {
            METRIC_CACHE_MISS
        };
        counter!(metric, "kind" => self.kind.as_str()).increment(1);
        found
    }

    /// Unconditional upsert; the last writer for a key wins.
    pub fn put(&self, key: K, value: V) {
        let len = {
            let mut entries = lock::write(&self.entries, self.kind);
            entries.insert(key, value);
            entries.len()
        };
        gauge!(METRIC_CACHE_ENTRIES, "kind" => self.kind.as_str()).set(len as f64);
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        lock::read(&self.entries, self.kind).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock::read(&self.entries, self.kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared cache handed to every store and to the read path at composition
/// time.
pub struct EntityCache {
    deliveries: CacheSlot<i64, DeliveryRecord>,
    payments: CacheSlot<i64, PaymentRecord>,
    items: CacheSlot<i64, ItemRecord>,
    orders: CacheSlot<String, OrderRecord>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self {
            deliveries: CacheSlot::new(EntityKind::Delivery),
            payments: CacheSlot::new(EntityKind::Payment),
            items: CacheSlot::new(EntityKind::Item),
            orders: CacheSlot::new(EntityKind::Order),
        }
    }

    pub fn deliveries(&self) -> &CacheSlot<i64, DeliveryRecord> {
        &self.deliveries
    }

    pub fn payments(&self) -> &CacheSlot<i64, PaymentRecord> {
        &self.payments
    }

    pub fn items(&self) -> &CacheSlot<i64, ItemRecord> {
        &self.items
    }

    pub fn orders(&self) -> &CacheSlot<String, OrderRecord> {
        &self.orders
    }

    pub fn get<E: Entity>(&self, key: &E::Key) -> Option<E> {
        E::slot(self).get(key)
    }

    pub fn put<E: Entity>(&self, record: E) {
        E::slot(self).put(record.key().clone(), record);
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Delivery => self.deliveries.len(),
            EntityKind::Payment => self.payments.len(),
            EntityKind::Item => self.items.len(),
            EntityKind::Order => self.orders.len(),
        }
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;
    use std::thread;

    use crate::domain::entities::NewDelivery;

    use super::*;

    fn delivery(id: i64, name: &str) -> DeliveryRecord {
        DeliveryRecord {
            id,
            details: NewDelivery {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    fn order(uid: &str) -> OrderRecord {
        OrderRecord {
            order_uid: uid.to_string(),
            track_number: "WBILMTESTTRACK".to_string(),
            entry: "WBIL".to_string(),
            delivery: 1,
            payment: 1,
            items: vec![1, 2],
            locale: "en".to_string(),
            internal_signature: String::new(),
            customer_id: "test".to_string(),
            delivery_service: "meest".to_string(),
            shardkey: "9".to_string(),
            sm_id: 99,
            date_created: "2021-11-26T06:22:19Z".to_string(),
            oof_shard: "1".to_string(),
        }
    }

    #[test]
    fn get_on_empty_cache_is_absent() {
        let cache = EntityCache::new();
        assert!(cache.get::<DeliveryRecord>(&1).is_none());
        assert!(cache.orders().get("missing").is_none());
        for kind in EntityKind::ALL {
            assert_eq!(cache.len(kind), 0);
        }
    }

    #[test]
    fn put_then_get_returns_equal_record() {
        let cache = EntityCache::new();
        cache.put(delivery(4, "Jane"));
        cache.put(order("abc123"));

        assert_eq!(cache.get::<DeliveryRecord>(&4), Some(delivery(4, "Jane")));
        assert_eq!(cache.orders().get("abc123"), Some(order("abc123")));
        assert_eq!(cache.len(EntityKind::Delivery), 1);
        assert_eq!(cache.len(EntityKind::Order), 1);
        assert_eq!(cache.len(EntityKind::Payment), 0);
    }

    #[test]
    fn kinds_do_not_share_key_space() {
        let cache = EntityCache::new();
        cache.put(delivery(1, "Jane"));

        assert!(cache.payments().get(&1).is_none());
        assert!(cache.items().get(&1).is_none());
        assert!(cache.deliveries().contains(&1));
    }

    #[test]
    fn last_writer_wins_on_same_key() {
        let cache = EntityCache::new();
        cache.put(delivery(9, "first"));
        cache.put(delivery(9, "second"));

        let cached = cache.get::<DeliveryRecord>(&9).expect("cached delivery");
        assert_eq!(cached.details.name, "second");
        assert_eq!(cache.len(EntityKind::Delivery), 1);
    }

    #[test]
    fn concurrent_writers_lose_no_entries() {
        let cache = Arc::new(EntityCache::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for n in 0..250 {
                        let id = worker * 1_000 + n;
                        cache.put(delivery(id, &format!("d-{id}")));
                        assert!(cache.get::<DeliveryRecord>(&id).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer thread");
        }

        assert_eq!(cache.len(EntityKind::Delivery), 8 * 250);
        let sample = cache.get::<DeliveryRecord>(&3_042).expect("sample entry");
        assert_eq!(sample.details.name, "d-3042");
    }

    #[test]
    fn slot_recovers_from_poisoned_lock() {
        let cache = EntityCache::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .deliveries
                .entries
                .write()
                .expect("deliveries lock should be acquired");
            panic!("poison deliveries lock");
        }));

        cache.put(delivery(5, "after-poison"));
        assert!(cache.get::<DeliveryRecord>(&5).is_some());
    }
}
