//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CliArgs, Command, DatabaseOverride, PublishArgs, ServeArgs, ServeOverrides};

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::jobs::INGEST_ORDER_QUEUE;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "orderflow";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_INGEST_POLL_INTERVAL_MS: u64 = 500;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub ingest: IngestSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub max_body_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    /// Deadline applied to every store call.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub queue: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backfill_on_miss: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("ORDERFLOW").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Publish(args)) => {
            raw.apply_database_override(&args.database);
            if let Some(queue) = args.ingest_queue.as_ref() {
                raw.ingest.queue = Some(queue.clone());
            }
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    ingest: RawIngestSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(bytes) = overrides.server_max_body_bytes {
            self.server.max_body_bytes = Some(bytes);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(seconds) = overrides.database_request_timeout_seconds {
            self.database.request_timeout_seconds = Some(seconds);
        }
        if let Some(queue) = overrides.ingest_queue.as_ref() {
            self.ingest.queue = Some(queue.clone());
        }
        if let Some(ms) = overrides.ingest_poll_interval_ms {
            self.ingest.poll_interval_ms = Some(ms);
        }
        if let Some(backfill) = overrides.cache_backfill_on_miss {
            self.cache.backfill_on_miss = Some(backfill);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            ingest,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            ingest: build_ingest_settings(ingest)?,
            cache: CacheSettings {
                backfill_on_miss: cache.backfill_on_miss.unwrap_or(false),
            },
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let max_body_value = server.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
    let max_body_bytes = NonZeroU64::new(max_body_value)
        .ok_or_else(|| LoadError::invalid("server.max_body_bytes", "must be greater than zero"))?;
    usize::try_from(max_body_value).map_err(|_| {
        LoadError::invalid(
            "server.max_body_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        max_body_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    let timeout_secs = database
        .request_timeout_seconds
        .unwrap_or(DEFAULT_DB_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "database.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_ingest_settings(ingest: RawIngestSettings) -> Result<IngestSettings, LoadError> {
    let queue = ingest
        .queue
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| INGEST_ORDER_QUEUE.to_string());
    if queue.is_empty() {
        return Err(LoadError::invalid("ingest.queue", "must not be empty"));
    }

    let poll_ms = ingest
        .poll_interval_ms
        .unwrap_or(DEFAULT_INGEST_POLL_INTERVAL_MS);
    if poll_ms == 0 {
        return Err(LoadError::invalid(
            "ingest.poll_interval_ms",
            "must be greater than zero",
        ));
    }

    Ok(IngestSettings {
        queue,
        poll_interval: Duration::from_millis(poll_ms),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIngestSettings {
    queue: Option<String>,
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backfill_on_miss: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
