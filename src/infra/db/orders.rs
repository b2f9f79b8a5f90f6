use async_trait::async_trait;

use crate::{
    application::repos::{EntityRepo, RepoError},
    domain::entities::OrderRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const ORDER_COLUMNS: &str = "order_uid, track_number, entry, delivery_id, payment_id, item_ids, \
     locale, internal_signature, customer_id, delivery_service, shardkey, sm_id, \
     date_created, oof_shard";

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    delivery_id: i64,
    payment_id: i64,
    item_ids: Vec<i64>,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: String,
    oof_shard: String,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            order_uid: row.order_uid,
            track_number: row.track_number,
            entry: row.entry,
            delivery: row.delivery_id,
            payment: row.payment_id,
            items: row.item_ids,
            locale: row.locale,
            internal_signature: row.internal_signature,
            customer_id: row.customer_id,
            delivery_service: row.delivery_service,
            shardkey: row.shardkey,
            sm_id: row.sm_id,
            date_created: row.date_created,
            oof_shard: row.oof_shard,
        }
    }
}

/// The order UID is caller-supplied; a second insert with the same UID fails
/// with [`RepoError::Duplicate`].
#[async_trait]
impl EntityRepo<OrderRecord> for PostgresRepositories {
    async fn insert(&self, new: OrderRecord) -> Result<OrderRecord, RepoError> {
        let sql = format!(
            "INSERT INTO orders (order_uid, track_number, entry, delivery_id, payment_id, \
             item_ids, locale, internal_signature, customer_id, delivery_service, shardkey, \
             sm_id, date_created, oof_shard) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(new.order_uid)
            .bind(new.track_number)
            .bind(new.entry)
            .bind(new.delivery)
            .bind(new.payment)
            .bind(new.items)
            .bind(new.locale)
            .bind(new.internal_signature)
            .bind(new.customer_id)
            .bind(new.delivery_service)
            .bind(new.shardkey)
            .bind(new.sm_id)
            .bind(new.date_created)
            .bind(new.oof_shard)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_key(&self, key: &String) -> Result<Option<OrderRecord>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_uid = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(key.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_uid");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
