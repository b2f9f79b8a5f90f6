use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the orderflow binary.
#[derive(Debug, Parser)]
#[command(
    name = "orderflow",
    version,
    about = "Order ingestion service with cached lookups"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ORDERFLOW_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the ingest worker and the HTTP service.
    Serve(Box<ServeArgs>),
    /// Publish an order message from a JSON file onto the ingest queue.
    Publish(PublishArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the maximum order submission body size in bytes.
    #[arg(long = "server-max-body-bytes", value_name = "BYTES")]
    pub server_max_body_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the per-call store deadline.
    #[arg(long = "database-request-timeout-seconds", value_name = "SECONDS")]
    pub database_request_timeout_seconds: Option<u64>,

    /// Override the ingest queue namespace.
    #[arg(long = "ingest-queue", value_name = "NAME")]
    pub ingest_queue: Option<String>,

    /// Override how often the ingest worker polls for messages.
    #[arg(long = "ingest-poll-interval-ms", value_name = "MS")]
    pub ingest_poll_interval_ms: Option<u64>,

    /// Write store results back into the cache on lookup misses.
    #[arg(
        long = "cache-backfill-on-miss",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_backfill_on_miss: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the ingest queue namespace.
    #[arg(long = "ingest-queue", value_name = "NAME")]
    pub ingest_queue: Option<String>,

    /// Path to the JSON order message to publish.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}
