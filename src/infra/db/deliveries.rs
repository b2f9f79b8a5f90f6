use async_trait::async_trait;

use crate::{
    application::repos::{EntityRepo, RepoError},
    domain::entities::{DeliveryRecord, NewDelivery},
};

use super::{PostgresRepositories, map_sqlx_error};

const DELIVERY_COLUMNS: &str = "id, name, phone, zip, city, address, region, email";

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: i64,
    name: String,
    phone: String,
    zip: String,
    city: String,
    address: String,
    region: String,
    email: String,
}

impl From<DeliveryRow> for DeliveryRecord {
    fn from(row: DeliveryRow) -> Self {
        Self {
            id: row.id,
            details: NewDelivery {
                name: row.name,
                phone: row.phone,
                zip: row.zip,
                city: row.city,
                address: row.address,
                region: row.region,
                email: row.email,
            },
        }
    }
}

#[async_trait]
impl EntityRepo<DeliveryRecord> for PostgresRepositories {
    async fn insert(&self, new: NewDelivery) -> Result<DeliveryRecord, RepoError> {
        let sql = format!(
            "INSERT INTO delivery (name, phone, zip, city, address, region, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {DELIVERY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(new.name)
            .bind(new.phone)
            .bind(new.zip)
            .bind(new.city)
            .bind(new.address)
            .bind(new.region)
            .bind(new.email)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_key(&self, key: &i64) -> Result<Option<DeliveryRecord>, RepoError> {
        let sql = format!("SELECT {DELIVERY_COLUMNS} FROM delivery WHERE id = $1");
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(*key)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<DeliveryRecord>, RepoError> {
        let sql = format!("SELECT {DELIVERY_COLUMNS} FROM delivery ORDER BY id");
        let rows = sqlx::query_as::<_, DeliveryRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
