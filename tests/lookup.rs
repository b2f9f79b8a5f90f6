use std::sync::Arc;

use orderflow::application::lookup::LookupSource;
use orderflow::application::service::EntityError;
use orderflow::domain::entities::{DeliveryRecord, NewDelivery, OrderRecord};
use orderflow::domain::types::EntityKind;

mod support;

use support::{Harness, MemoryRepo, sample_message};

fn seeded_delivery(id: i64) -> DeliveryRecord {
    DeliveryRecord {
        id,
        details: NewDelivery {
            name: format!("seeded-{id}"),
            ..Default::default()
        },
    }
}

async fn harness_with_seeded_delivery(id: i64) -> Harness {
    let delivery_repo = Arc::new(MemoryRepo::<DeliveryRecord>::new());
    delivery_repo.seed(seeded_delivery(id)).await;
    Harness::build(
        delivery_repo,
        Arc::new(MemoryRepo::new()),
        Arc::new(MemoryRepo::new()),
        Arc::new(MemoryRepo::new()),
        support::TEST_TIMEOUT,
    )
}

#[tokio::test]
async fn ingested_records_are_served_from_cache() {
    let harness = Harness::new();
    let order = harness
        .pipeline
        .ingest(&sample_message("cached").to_string())
        .await
        .expect("ingest");

    let lookups = harness.lookup(&harness.orders, false);
    let lookup = lookups.get(&"cached".to_string()).await.expect("lookup");

    assert_eq!(lookup.source, LookupSource::Cache);
    assert_eq!(lookup.record, order);
}

#[tokio::test]
async fn miss_falls_through_to_store_without_backfill() {
    let harness = harness_with_seeded_delivery(7).await;
    let lookups = harness.lookup(&harness.deliveries, false);

    let first = lookups.get(&7).await.expect("store lookup");
    assert_eq!(first.source, LookupSource::Store);
    assert_eq!(first.record, seeded_delivery(7));
    assert!(!harness.cache.deliveries().contains(&7));

    let second = lookups.get(&7).await.expect("repeat lookup");
    assert_eq!(second.source, LookupSource::Store);
}

#[tokio::test]
async fn backfill_caches_store_hits() {
    let harness = harness_with_seeded_delivery(9).await;
    let lookups = harness.lookup(&harness.deliveries, true);

    let first = lookups.get(&9).await.expect("store lookup");
    assert_eq!(first.source, LookupSource::Store);

    let second = lookups.get(&9).await.expect("cached lookup");
    assert_eq!(second.source, LookupSource::Cache);
    assert_eq!(second.record, first.record);
}

#[tokio::test]
async fn unknown_keys_are_not_found_on_both_paths() {
    let harness = Harness::new();
    assert!(harness.cache.get::<DeliveryRecord>(&404).is_none());

    let err = harness
        .lookup(&harness.deliveries, true)
        .get(&404)
        .await
        .expect_err("absent delivery");
    assert!(matches!(
        err,
        EntityError::NotFound {
            kind: EntityKind::Delivery,
            ..
        }
    ));

    let err = harness
        .lookup(&harness.orders, false)
        .get(&"missing".to_string())
        .await
        .expect_err("absent order");
    assert!(matches!(
        err,
        EntityError::NotFound {
            kind: EntityKind::Order,
            ..
        }
    ));
    assert!(harness.cache.get::<OrderRecord>(&"missing".to_string()).is_none());
}
