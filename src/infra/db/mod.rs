//! Postgres-backed repository implementations.

mod deliveries;
mod items;
mod orders;
mod payments;
mod queue;
mod util;

pub use queue::PostgresOrderQueue;
pub use util::map_sqlx_error;

use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthProbe, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    /// Apply the entity schema. The apalis queue records its own versions in
    /// the same history table, so versions we do not ship are tolerated.
    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(pool).await.map_err(Into::into)
    }

    /// Create the `apalis` schema backing the order queue.
    pub async fn setup_queue(pool: &PgPool) -> Result<(), sqlx::Error> {
        PostgresStorage::<()>::setup(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

#[async_trait]
impl HealthProbe for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
