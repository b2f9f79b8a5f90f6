//! In-memory doubles for the store, queue and health probe, plus a harness
//! wiring them into the real services the way `main` does.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use orderflow::application::entity::Entity;
use orderflow::application::ingest::IngestionPipeline;
use orderflow::application::jobs::IngestOrderJob;
use orderflow::application::lookup::LookupService;
use orderflow::application::repos::{EntityRepo, HealthProbe, OrderQueue, RepoError};
use orderflow::application::service::EntityService;
use orderflow::application::store::EntityStore;
use orderflow::cache::EntityCache;
use orderflow::domain::entities::{
    DeliveryRecord, ItemRecord, NewDelivery, NewItem, NewPayment, OrderRecord, PaymentRecord,
};
use orderflow::infra::http::HttpState;

/// How a creation payload becomes a stored row.
pub trait Persist: Entity {
    fn persist(new: Self::New, next_id: i64) -> Self;
}

impl Persist for DeliveryRecord {
    fn persist(new: NewDelivery, next_id: i64) -> Self {
        Self {
            id: next_id,
            details: new,
        }
    }
}

impl Persist for PaymentRecord {
    fn persist(new: NewPayment, next_id: i64) -> Self {
        Self {
            id: next_id,
            details: new,
        }
    }
}

impl Persist for ItemRecord {
    fn persist(new: NewItem, next_id: i64) -> Self {
        Self {
            id: next_id,
            details: new,
        }
    }
}

impl Persist for OrderRecord {
    fn persist(new: OrderRecord, _next_id: i64) -> Self {
        new
    }
}

pub struct MemoryRepo<E: Entity> {
    rows: Mutex<HashMap<E::Key, E>>,
    next_id: AtomicI64,
    delay: Option<Duration>,
    fail_inserts: AtomicBool,
}

impl<E: Entity> MemoryRepo<E> {
    pub fn new() -> Self {
        Self::with_delay(None)
    }

    pub fn with_delay(delay: Option<Duration>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            delay,
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn rows(&self) -> Vec<E> {
        self.rows.lock().await.values().cloned().collect()
    }

    /// Insert directly, bypassing stores and the cache, as if the row were
    /// written by an earlier process.
    pub async fn seed(&self, record: E) {
        self.rows.lock().await.insert(record.key().clone(), record);
    }
}

impl<E: Entity> Default for MemoryRepo<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Persist> EntityRepo<E> for MemoryRepo<E> {
    async fn insert(&self, new: E::New) -> Result<E, RepoError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("injected insert failure"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = E::persist(new, id);
        let mut rows = self.rows.lock().await;
        if rows.contains_key(record.key()) {
            return Err(RepoError::Duplicate {
                constraint: format!("{}_pkey", E::KIND),
            });
        }
        rows.insert(record.key().clone(), record.clone());
        Ok(record)
    }

    async fn find_by_key(&self, key: &E::Key) -> Result<Option<E>, RepoError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.rows.lock().await.get(key).cloned())
    }

    async fn list_all(&self) -> Result<Vec<E>, RepoError> {
        Ok(self.rows.lock().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<Vec<IngestOrderJob>>,
    offline: AtomicBool,
}

impl MemoryQueue {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn jobs(&self) -> Vec<IngestOrderJob> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl OrderQueue for MemoryQueue {
    async fn publish(&self, job: IngestOrderJob) -> Result<String, RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("queue offline"));
        }
        let mut jobs = self.jobs.lock().await;
        jobs.push(job);
        Ok(format!("job-{}", jobs.len()))
    }
}

pub struct MemoryHealth {
    healthy: AtomicBool,
}

impl MemoryHealth {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

impl Default for MemoryHealth {
    fn default() -> Self {
        Self {
            healthy: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl HealthProbe for MemoryHealth {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::from_persistence("connection refused"))
        }
    }
}

pub struct Harness {
    pub cache: Arc<EntityCache>,
    pub delivery_repo: Arc<MemoryRepo<DeliveryRecord>>,
    pub payment_repo: Arc<MemoryRepo<PaymentRecord>>,
    pub item_repo: Arc<MemoryRepo<ItemRecord>>,
    pub order_repo: Arc<MemoryRepo<OrderRecord>>,
    pub deliveries: Arc<EntityService<DeliveryRecord>>,
    pub payments: Arc<EntityService<PaymentRecord>>,
    pub items: Arc<EntityService<ItemRecord>>,
    pub orders: Arc<EntityService<OrderRecord>>,
    pub pipeline: Arc<IngestionPipeline>,
    pub queue: Arc<MemoryQueue>,
    pub health: Arc<MemoryHealth>,
}

pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

impl Harness {
    pub fn new() -> Self {
        Self::build(
            Arc::new(MemoryRepo::new()),
            Arc::new(MemoryRepo::new()),
            Arc::new(MemoryRepo::new()),
            Arc::new(MemoryRepo::new()),
            TEST_TIMEOUT,
        )
    }

    pub fn build(
        delivery_repo: Arc<MemoryRepo<DeliveryRecord>>,
        payment_repo: Arc<MemoryRepo<PaymentRecord>>,
        item_repo: Arc<MemoryRepo<ItemRecord>>,
        order_repo: Arc<MemoryRepo<OrderRecord>>,
        timeout: Duration,
    ) -> Self {
        let cache = Arc::new(EntityCache::new());
        let deliveries = service(delivery_repo.clone(), &cache, timeout);
        let payments = service(payment_repo.clone(), &cache, timeout);
        let items = service(item_repo.clone(), &cache, timeout);
        let orders = service(order_repo.clone(), &cache, timeout);
        let pipeline = Arc::new(IngestionPipeline::new(
            deliveries.clone(),
            payments.clone(),
            items.clone(),
            orders.clone(),
        ));

        Self {
            cache,
            delivery_repo,
            payment_repo,
            item_repo,
            order_repo,
            deliveries,
            payments,
            items,
            orders,
            pipeline,
            queue: Arc::new(MemoryQueue::default()),
            health: Arc::new(MemoryHealth::default()),
        }
    }

    pub fn lookup<E: Entity>(
        &self,
        service: &Arc<EntityService<E>>,
        backfill_on_miss: bool,
    ) -> LookupService<E> {
        LookupService::new(self.cache.clone(), service.clone(), backfill_on_miss)
    }

    pub fn http_state(&self, backfill_on_miss: bool) -> HttpState {
        HttpState {
            deliveries: Arc::new(self.lookup(&self.deliveries, backfill_on_miss)),
            payments: Arc::new(self.lookup(&self.payments, backfill_on_miss)),
            items: Arc::new(self.lookup(&self.items, backfill_on_miss)),
            orders: Arc::new(self.lookup(&self.orders, backfill_on_miss)),
            queue: self.queue.clone(),
            health: self.health.clone(),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn service<E: Persist>(
    repo: Arc<MemoryRepo<E>>,
    cache: &Arc<EntityCache>,
    timeout: Duration,
) -> Arc<EntityService<E>> {
    let repo: Arc<dyn EntityRepo<E>> = repo;
    let store = Arc::new(EntityStore::new(repo, cache.clone(), timeout));
    Arc::new(EntityService::new(store))
}

/// The sample order message used across the suites.
pub fn sample_message(order_uid: &str) -> serde_json::Value {
    serde_json::json!({
        "order_uid": order_uid,
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {
            "name": "Jane",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "jane@example.com"
        },
        "payment": {
            "transaction": "tx1",
            "request_id": "",
            "currency": "USD",
            "provider": "wbpay",
            "amount": 500,
            "payment_dt": 1637907727,
            "bank": "alpha",
            "delivery_cost": 150,
            "goods_total": 350,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 1,
                "track_number": "WBILMTESTTRACK",
                "price": 100,
                "rid": "ab4219087a764ae0btest",
                "name": "Mascaras",
                "sale": 30,
                "size": "0",
                "total_price": 70,
                "nm_id": 2389212,
                "brand": "Vivienne Sabo",
                "status": 202
            }
        ],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    })
}
