use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::{
    jobs::IngestOrderJob,
    repos::{OrderQueue, RepoError},
};

use super::{PostgresRepositories, map_sqlx_error};

/// A failed order message is never retried.
const INGEST_MAX_ATTEMPTS: i32 = 1;
const INGEST_PRIORITY: i32 = 0;

/// Publisher for the apalis-backed order queue.
///
/// `namespace` must match the one the ingest worker's storage polls.
#[derive(Clone)]
pub struct PostgresOrderQueue {
    repositories: Arc<PostgresRepositories>,
    namespace: String,
}

impl PostgresOrderQueue {
    pub fn new(repositories: Arc<PostgresRepositories>, namespace: impl Into<String>) -> Self {
        Self {
            repositories,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl OrderQueue for PostgresOrderQueue {
    async fn publish(&self, job: IngestOrderJob) -> Result<String, RepoError> {
        let payload = serde_json::to_value(&job).map_err(RepoError::from_persistence)?;

        let id: String = sqlx::query_scalar(
            r#"
            SELECT (apalis.push_job($1, $2::json, $3, $4, $5, $6)).id
            "#,
        )
        .bind(self.namespace.as_str())
        .bind(payload)
        .bind("Pending")
        .bind(OffsetDateTime::now_utc())
        .bind(INGEST_MAX_ATTEMPTS)
        .bind(INGEST_PRIORITY)
        .fetch_one(self.repositories.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }
}
