mod context;
mod ingest;

pub use context::{IngestWorkerContext, job_failed};
pub use ingest::{
    INGEST_ORDER_QUEUE, IngestOrderJob, PublishError, process_ingest_order_job,
    publish_order_message,
};
