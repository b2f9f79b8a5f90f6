//! Order ingestion: decode one message, create its parts, link the order.

use std::{fmt, sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::{NewDelivery, NewItem, NewPayment, OrderRecord, OrderShell};

use super::service::{
    DeliveryService, EntityError, ItemService, OrderService, PaymentService,
};

const METRIC_INGEST_TOTAL: &str = "orderflow_ingest_total";
const METRIC_INGEST_MS: &str = "orderflow_ingest_ms";

/// Decoded order message: order-level fields at the top level alongside the
/// three sub-entity payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderEnvelope {
    #[serde(flatten)]
    pub order: OrderShell,
    pub delivery: NewDelivery,
    pub payment: NewPayment,
    /// Must be present; `null` decodes as an empty list.
    #[serde(deserialize_with = "items_or_empty")]
    pub items: Vec<NewItem>,
}

fn items_or_empty<'de, D>(deserializer: D) -> Result<Vec<NewItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<NewItem>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl OrderEnvelope {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStep {
    Delivery,
    Payment,
    Items,
    Order,
}

impl IngestStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "create_delivery",
            Self::Payment => "create_payment",
            Self::Items => "create_items",
            Self::Order => "create_order",
        }
    }
}

impl fmt::Display for IngestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows persisted by earlier steps of a message that later failed.
/// Nothing references them and nothing removes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Orphans {
    pub delivery: Option<i64>,
    pub payment: Option<i64>,
    pub items: Vec<i64>,
}

impl Orphans {
    pub fn is_empty(&self) -> bool {
        self.delivery.is_none() && self.payment.is_none() && self.items.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("order message could not be decoded")]
    Decode(#[source] serde_json::Error),
    #[error("ingestion of order `{order_uid}` failed at step {step}")]
    Step {
        step: IngestStep,
        order_uid: String,
        orphans: Orphans,
        #[source]
        source: EntityError,
    },
}

impl IngestError {
    pub fn orphans(&self) -> Option<&Orphans> {
        match self {
            Self::Decode(_) => None,
            Self::Step { orphans, .. } => Some(orphans),
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::Step { .. } => "step_failed",
        }
    }
}

/// Runs one message to completion or to its first failing step.
///
/// Steps run strictly in sequence: delivery, payment, items, then the order
/// that references them. There is no retry and no rollback.
pub struct IngestionPipeline {
    deliveries: Arc<DeliveryService>,
    payments: Arc<PaymentService>,
    items: Arc<ItemService>,
    orders: Arc<OrderService>,
}

impl IngestionPipeline {
    pub fn new(
        deliveries: Arc<DeliveryService>,
        payments: Arc<PaymentService>,
        items: Arc<ItemService>,
        orders: Arc<OrderService>,
    ) -> Self {
        Self {
            deliveries,
            payments,
            items,
            orders,
        }
    }

    /// Decode and ingest one raw message.
    pub async fn ingest(&self, raw: &str) -> Result<OrderRecord, IngestError> {
        let started = Instant::now();
        let result = match OrderEnvelope::decode(raw) {
            Ok(envelope) => self.ingest_envelope(envelope).await,
            Err(err) => {
                warn!(
                    target = "orderflow::ingest",
                    error = %err,
                    "order message dropped: malformed payload"
                );
                Err(IngestError::Decode(err))
            }
        };

        let outcome = match &result {
            Ok(_) => "created",
            Err(err) => err.outcome(),
        };
        counter!(METRIC_INGEST_TOTAL, "outcome" => outcome).increment(1);
        histogram!(METRIC_INGEST_MS).record(started.elapsed().as_secs_f64() * 1_000.0);

        result
    }

    pub async fn ingest_envelope(
        &self,
        envelope: OrderEnvelope,
    ) -> Result<OrderRecord, IngestError> {
        let OrderEnvelope {
            order: shell,
            delivery,
            payment,
            items,
        } = envelope;
        let order_uid = shell.order_uid.clone();
        let mut orphans = Orphans::default();

        let delivery = match self.deliveries.create(delivery).await {
            Ok(record) => record,
            Err(source) => return Err(abort(IngestStep::Delivery, order_uid, orphans, source)),
        };
        orphans.delivery = Some(delivery.id);

        let payment = match self.payments.create(payment).await {
            Ok(record) => record,
            Err(source) => return Err(abort(IngestStep::Payment, order_uid, orphans, source)),
        };
        orphans.payment = Some(payment.id);

        let item_ids = match self.items.create_batch(items).await {
            Ok(ids) => ids,
            Err(batch) => {
                orphans.items = batch.created;
                return Err(abort(IngestStep::Items, order_uid, orphans, batch.source));
            }
        };

        let order = OrderRecord::assemble(shell, delivery.id, payment.id, item_ids.clone());
        let order = match self.orders.create(order).await {
            Ok(record) => record,
            Err(source) => {
                orphans.items = item_ids;
                return Err(abort(IngestStep::Order, order_uid, orphans, source));
            }
        };

        info!(
            target = "orderflow::ingest",
            order_uid = %order.order_uid,
            delivery = order.delivery,
            payment = order.payment,
            items = ?order.items,
            "order ingested"
        );
        Ok(order)
    }
}

fn abort(step: IngestStep, order_uid: String, orphans: Orphans, source: EntityError) -> IngestError {
    warn!(
        target = "orderflow::ingest",
        step = %step,
        order_uid = %order_uid,
        orphan_delivery = ?orphans.delivery,
        orphan_payment = ?orphans.payment,
        orphan_items = ?orphans.items,
        error = %source,
        "order message aborted"
    );
    IngestError::Step {
        step,
        order_uid,
        orphans,
        source,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_splits_envelope_into_parts() {
        let raw = json!({
            "order_uid": "abc123",
            "track_number": "WBILMTESTTRACK",
            "sm_id": 99,
            "delivery": { "name": "Jane", "city": "Kazan" },
            "payment": { "transaction": "tx1", "currency": "USD", "amount": 500 },
            "items": [
                { "chrt_id": 1, "price": 100 },
                { "chrt_id": 2, "price": 250 }
            ]
        })
        .to_string();

        let envelope = OrderEnvelope::decode(&raw).expect("decode");
        assert_eq!(envelope.order.order_uid, "abc123");
        assert_eq!(envelope.order.sm_id, 99);
        assert_eq!(envelope.delivery.city, "Kazan");
        assert_eq!(envelope.payment.amount, 500);
        let chrt_ids: Vec<i64> = envelope.items.iter().map(|item| item.chrt_id).collect();
        assert_eq!(chrt_ids, vec![1, 2]);
    }

    #[test]
    fn null_or_empty_items_decode_as_empty() {
        for items in [json!(null), json!([])] {
            let raw = json!({
                "order_uid": "a",
                "delivery": {},
                "payment": {},
                "items": items
            });
            let envelope = OrderEnvelope::decode(&raw.to_string()).expect("decode");
            assert!(envelope.items.is_empty());
        }
    }

    #[test]
    fn missing_items_key_fails_decode() {
        let raw = json!({
            "order_uid": "a",
            "delivery": {},
            "payment": {}
        });
        assert!(OrderEnvelope::decode(&raw.to_string()).is_err());
    }

    #[test]
    fn wrong_shapes_fail_decode() {
        let cases = [
            "not json".to_string(),
            json!({ "order_uid": "a", "delivery": "Jane", "payment": {} }).to_string(),
            json!({ "order_uid": "a", "delivery": {}, "payment": {}, "items": { "chrt_id": 1 } })
                .to_string(),
            json!({ "order_uid": "a", "payment": {} }).to_string(),
        ];

        for raw in cases {
            assert!(OrderEnvelope::decode(&raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn orphans_report_emptiness() {
        assert!(Orphans::default().is_empty());
        let orphans = Orphans {
            delivery: Some(1),
            ..Default::default()
        };
        assert!(!orphans.is_empty());
    }
}
