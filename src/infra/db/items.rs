use async_trait::async_trait;

use crate::{
    application::repos::{EntityRepo, RepoError},
    domain::entities::{ItemRecord, NewItem},
};

use super::{PostgresRepositories, map_sqlx_error};

const ITEM_COLUMNS: &str = "id, chrt_id, track_number, price, rid, name, sale, size, \
     total_price, nm_id, brand, status";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    chrt_id: i64,
    track_number: String,
    price: i64,
    rid: String,
    name: String,
    sale: i64,
    size: String,
    total_price: i64,
    nm_id: i64,
    brand: String,
    status: i64,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            details: NewItem {
                chrt_id: row.chrt_id,
                track_number: row.track_number,
                price: row.price,
                rid: row.rid,
                name: row.name,
                sale: row.sale,
                size: row.size,
                total_price: row.total_price,
                nm_id: row.nm_id,
                brand: row.brand,
                status: row.status,
            },
        }
    }
}

#[async_trait]
impl EntityRepo<ItemRecord> for PostgresRepositories {
    async fn insert(&self, new: NewItem) -> Result<ItemRecord, RepoError> {
        let sql = format!(
            "INSERT INTO item (chrt_id, track_number, price, rid, name, sale, size, \
             total_price, nm_id, brand, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(new.chrt_id)
            .bind(new.track_number)
            .bind(new.price)
            .bind(new.rid)
            .bind(new.name)
            .bind(new.sale)
            .bind(new.size)
            .bind(new.total_price)
            .bind(new.nm_id)
            .bind(new.brand)
            .bind(new.status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_key(&self, key: &i64) -> Result<Option<ItemRecord>, RepoError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item WHERE id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*key)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<ItemRecord>, RepoError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item ORDER BY id");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
