use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use orderflow::{
    application::{
        entity::Entity,
        error::AppError,
        ingest::IngestionPipeline,
        jobs::{IngestWorkerContext, process_ingest_order_job, publish_order_message},
        lookup::LookupService,
        repos::EntityRepo,
        service::EntityService,
        store::EntityStore,
    },
    cache::EntityCache,
    config,
    domain::entities::{DeliveryRecord, ItemRecord, OrderRecord, PaymentRecord},
    domain::types::EntityKind,
    infra::{
        db::{PostgresOrderQueue, PostgresRepositories},
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Publish(args) => run_publish(settings, args).await,
    }
}

struct Services {
    deliveries: Arc<EntityService<DeliveryRecord>>,
    payments: Arc<EntityService<PaymentRecord>>,
    items: Arc<EntityService<ItemRecord>>,
    orders: Arc<EntityService<OrderRecord>>,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = Arc::new(EntityCache::new());
    let timeout = settings.database.request_timeout;

    let services = Services {
        deliveries: entity_service(repositories.clone(), &cache, timeout),
        payments: entity_service(repositories.clone(), &cache, timeout),
        items: entity_service(repositories.clone(), &cache, timeout),
        orders: entity_service(repositories.clone(), &cache, timeout),
    };

    preload_cache(&services, &cache).await?;

    let pipeline = Arc::new(IngestionPipeline::new(
        services.deliveries.clone(),
        services.payments.clone(),
        services.items.clone(),
        services.orders.clone(),
    ));
    let monitor_handle = spawn_ingest_monitor(
        repositories.clone(),
        IngestWorkerContext { pipeline },
        &settings.ingest,
    );

    let backfill = settings.cache.backfill_on_miss;
    let http_state = HttpState {
        deliveries: lookup_service(&cache, &services.deliveries, backfill),
        payments: lookup_service(&cache, &services.payments, backfill),
        items: lookup_service(&cache, &services.items, backfill),
        orders: lookup_service(&cache, &services.orders, backfill),
        queue: Arc::new(PostgresOrderQueue::new(
            repositories.clone(),
            settings.ingest.queue.clone(),
        )),
        health: repositories,
    };

    let result = serve_http(&settings, http_state).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_publish(
    settings: config::Settings,
    args: config::PublishArgs,
) -> Result<(), AppError> {
    let message = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = init_repositories(&settings).await?;
    let queue = PostgresOrderQueue::new(repositories, settings.ingest.queue.clone());

    let job_id = publish_order_message(&queue, message)
        .await
        .map_err(|err| AppError::from(InfraError::queue(err.to_string())))?;

    info!(
        target = "orderflow::publish",
        job_id = %job_id,
        file = %args.file.display(),
        queue = queue.namespace(),
        "order message published"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::setup_queue(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::queue(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn entity_service<E>(
    repositories: Arc<PostgresRepositories>,
    cache: &Arc<EntityCache>,
    timeout: Duration,
) -> Arc<EntityService<E>>
where
    E: Entity,
    PostgresRepositories: EntityRepo<E>,
{
    let repo: Arc<dyn EntityRepo<E>> = repositories;
    let store = Arc::new(EntityStore::new(repo, cache.clone(), timeout));
    Arc::new(EntityService::new(store))
}

fn lookup_service<E: Entity>(
    cache: &Arc<EntityCache>,
    service: &Arc<EntityService<E>>,
    backfill_on_miss: bool,
) -> Arc<LookupService<E>> {
    Arc::new(LookupService::new(
        cache.clone(),
        service.clone(),
        backfill_on_miss,
    ))
}

/// Rebuild the cache from the store before any traffic is accepted.
async fn preload_cache(services: &Services, cache: &EntityCache) -> Result<(), AppError> {
    let preload = |err: orderflow::application::service::EntityError| {
        AppError::Preload(err.to_string())
    };

    services.deliveries.preload().await.map_err(preload)?;
    services.orders.preload().await.map_err(preload)?;
    services.items.preload().await.map_err(preload)?;
    services.payments.preload().await.map_err(preload)?;

    info!(
        target = "orderflow::startup",
        deliveries = cache.len(EntityKind::Delivery),
        orders = cache.len(EntityKind::Order),
        items = cache.len(EntityKind::Item),
        payments = cache.len(EntityKind::Payment),
        "cache preloaded"
    );
    Ok(())
}

fn spawn_ingest_monitor(
    repositories: Arc<PostgresRepositories>,
    context: IngestWorkerContext,
    ingest: &config::IngestSettings,
) -> tokio::task::JoinHandle<()> {
    let storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(&ingest.queue).set_poll_interval(ingest.poll_interval),
    );

    let ingest_worker = WorkerBuilder::new("ingest-order-worker")
        .concurrency(1)
        .data(context)
        .backend(storage)
        .build_fn(process_ingest_order_job);

    let monitor = Monitor::new().register(ingest_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let max_body_bytes = usize::try_from(settings.server.max_body_bytes.get())
        .map_err(|_| AppError::unexpected("server.max_body_bytes exceeds usize"))?;
    let router = http::build_router(http_state, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "orderflow::startup",
        addr = %settings.server.addr,
        "http listener ready"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = stop_rx.wait_for(|stop| *stop).await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        _ = shutdown_signal() => {
            let _ = stop_tx.send(true);
            match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
                Ok(result) => {
                    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
                }
                Err(_) => {
                    warn!(
                        target = "orderflow::shutdown",
                        grace = ?settings.server.graceful_shutdown,
                        "in-flight requests did not drain before the deadline"
                    );
                    Ok(())
                }
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(target = "orderflow::shutdown", "received Ctrl+C, shutting down"),
        _ = terminate => info!(target = "orderflow::shutdown", "received SIGTERM, shutting down"),
    }
}
