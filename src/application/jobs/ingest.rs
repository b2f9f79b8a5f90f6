use apalis::prelude::{Data, Error as ApalisError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::application::repos::{OrderQueue, RepoError};

use super::context::{IngestWorkerContext, job_failed};

/// Queue namespace shared by the publisher and the ingest worker.
pub const INGEST_ORDER_QUEUE: &str = "orderflow::ingest-order";

/// One order message in transit. The text is carried verbatim; decoding
/// happens inside the worker so malformed messages fail there, not at
/// publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOrderJob {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("order message must be a JSON object: {0}")]
    InvalidPayload(String),
    #[error("order message could not be published")]
    Transport(#[source] RepoError),
}

/// Publish a raw order message onto the ingest queue, returning the job id.
///
/// Only the outer shape is checked here; the pipeline owns full decoding.
pub async fn publish_order_message<Q: OrderQueue + ?Sized>(
    queue: &Q,
    message: String,
) -> Result<String, PublishError> {
    match serde_json::from_str::<serde_json::Value>(&message) {
        Ok(serde_json::Value::Object(_)) => {}
        Ok(other) => {
            return Err(PublishError::InvalidPayload(format!(
                "expected an object, got {}",
                json_kind(&other)
            )));
        }
        Err(err) => return Err(PublishError::InvalidPayload(err.to_string())),
    }

    let job_id = queue
        .publish(IngestOrderJob { message })
        .await
        .map_err(PublishError::Transport)?;

    info!(
        target = "orderflow::jobs::publish",
        job_id = %job_id,
        "order message queued"
    );
    Ok(job_id)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

pub async fn process_ingest_order_job(
    job: IngestOrderJob,
    context: Data<IngestWorkerContext>,
) -> Result<(), ApalisError> {
    match context.pipeline.ingest(&job.message).await {
        Ok(_) => Ok(()),
        Err(err) => {
            error!(
                target = "orderflow::jobs::process_ingest_order_job",
                error = %err,
                "order message abandoned"
            );
            Err(job_failed(err))
        }
    }
}
