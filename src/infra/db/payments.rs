use async_trait::async_trait;

use crate::{
    application::repos::{EntityRepo, RepoError},
    domain::entities::{NewPayment, PaymentRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

const PAYMENT_COLUMNS: &str = "id, transaction, request_id, currency, provider, amount, \
     payment_dt, bank, delivery_cost, goods_total, custom_fee";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    transaction: String,
    request_id: String,
    currency: String,
    provider: String,
    amount: i64,
    payment_dt: i64,
    bank: String,
    delivery_cost: i64,
    goods_total: i64,
    custom_fee: i64,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            details: NewPayment {
                transaction: row.transaction,
                request_id: row.request_id,
                currency: row.currency,
                provider: row.provider,
                amount: row.amount,
                payment_dt: row.payment_dt,
                bank: row.bank,
                delivery_cost: row.delivery_cost,
                goods_total: row.goods_total,
                custom_fee: row.custom_fee,
            },
        }
    }
}

#[async_trait]
impl EntityRepo<PaymentRecord> for PostgresRepositories {
    async fn insert(&self, new: NewPayment) -> Result<PaymentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO payment (transaction, request_id, currency, provider, amount, \
             payment_dt, bank, delivery_cost, goods_total, custom_fee) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(new.transaction)
            .bind(new.request_id)
            .bind(new.currency)
            .bind(new.provider)
            .bind(new.amount)
            .bind(new.payment_dt)
            .bind(new.bank)
            .bind(new.delivery_cost)
            .bind(new.goods_total)
            .bind(new.custom_fee)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_key(&self, key: &i64) -> Result<Option<PaymentRecord>, RepoError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payment WHERE id = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*key)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<PaymentRecord>, RepoError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payment ORDER BY id");
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
