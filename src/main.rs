use std::{process, sync::Arc, time::Duration};

use itemdir::{
    application::{directory::ItemDirectoryService, error::AppError, repos::ItemsRepo},
    cache::{CacheConfig, CacheStore, LruCacheStore, RedisCacheStore},
    config::{self, CacheBackend},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        memory::InMemoryItemsRepo,
        telemetry,
    },
};
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
    let mut chain = Vec::new();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }

    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repo = init_repository(&settings).await?;
    let cache_config = CacheConfig::from(&settings.cache);
    let directory = match init_cache_store(&settings.cache).await? {
        Some(cache) => ItemDirectoryService::new(repo, cache, &cache_config),
        None => ItemDirectoryService::uncached(repo),
    };

    info!(
        target = "itemdir::bootstrap",
        store_backend = directory.store_backend(),
        cache_enabled = directory.cache_enabled(),
        cache_backend = directory.cache_backend(),
        invalidation_concurrency = cache_config.invalidation_concurrency.get(),
        "Directory service configured"
    );

    let directory = Arc::new(directory);
    serve_http(&settings, HttpState::new(directory)).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, &settings.database)
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "itemdir::migrate", "Migrations applied");
    Ok(())
}

async fn init_repository(settings: &config::Settings) -> Result<Arc<dyn ItemsRepo>, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "itemdir::bootstrap",
            "No database url configured; items are kept in memory and lost on exit"
        );
        return Ok(Arc::new(InMemoryItemsRepo::new()));
    };

    let pool = PostgresRepositories::connect(database_url, &settings.database)
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

/// `None` when caching is switched off; no store is built in that case.
async fn init_cache_store(
    settings: &config::CacheSettings,
) -> Result<Option<Arc<dyn CacheStore>>, AppError> {
    if !settings.enabled {
        return Ok(None);
    }

    match settings.backend {
        CacheBackend::Memory => Ok(Some(Arc::new(LruCacheStore::new(settings.memory_capacity)))),
        CacheBackend::Redis => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| InfraError::configuration("cache.redis_url is not configured"))?;
            let store = RedisCacheStore::connect(url, settings.ttl)
                .await
                .map_err(InfraError::from)?;
            Ok(Some(Arc::new(store)))
        }
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "itemdir::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let drain = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(drain))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C, then arms a watchdog that exits if draining stalls.
async fn shutdown_signal(drain: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "itemdir::http", error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!(
        target = "itemdir::http",
        drain_seconds = drain.as_secs(),
        "Shutdown requested; draining connections"
    );

    tokio::spawn(async move {
        tokio::time::sleep(drain).await;
        warn!(target = "itemdir::http", "Graceful shutdown timed out");
        process::exit(1);
    });
}
