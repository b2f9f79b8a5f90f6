//! Tracing subscriber installation and metric descriptions.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "orderflow_cache_hit_total",
            Unit::Count,
            "Total number of entity cache hits, by kind."
        );
        describe_counter!(
            "orderflow_cache_miss_total",
            Unit::Count,
            "Total number of entity cache misses, by kind."
        );
        describe_gauge!(
            "orderflow_cache_entries",
            Unit::Count,
            "Current number of cached entities, by kind."
        );
        describe_counter!(
            "orderflow_ingest_total",
            Unit::Count,
            "Order messages processed, by outcome."
        );
        describe_histogram!(
            "orderflow_ingest_ms",
            Unit::Milliseconds,
            "Order message ingestion latency in milliseconds."
        );
    });
}
