//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, Redis setup, worker spawning, and Axum server lifecycle.

use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::infrastructure::cache::{LinkCache, NullCache, RedisLinkCache};
use crate::infrastructure::geoip;
use crate::infrastructure::metrics::{MemoryMetricsStore, MetricsStore, RedisMetricsStore};
use crate::infrastructure::persistence::{PgClickAggregateRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::{AppState, Backends, Settings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Builds every storage backend.
///
/// Redis backs both the link cache and the metrics store over one shared
/// connection. Without Redis, or when it cannot be reached, the cache is
/// disabled and metrics are kept in process memory.
pub async fn build_backends(config: &Config, pool: PgPool) -> Backends {
    let pool = Arc::new(pool);

    let (cache, metrics_store): (Arc<dyn LinkCache>, Arc<dyn MetricsStore>) =
        match &config.redis_url {
            Some(redis_url) => match RedisLinkCache::connect(redis_url).await {
                Ok(redis) => {
                    let connection = redis.connection();
                    let metrics: Arc<dyn MetricsStore> =
                        match RedisMetricsStore::from_manager(connection).await {
                            Ok(store) => Arc::new(store),
                            Err(e) => {
                                tracing::warn!(
                                    "Redis metrics store unavailable: {}. Using in-memory metrics.",
                                    e
                                );
                                Arc::new(MemoryMetricsStore::new())
                            }
                        };
                    tracing::info!("Cache enabled (Redis)");
                    (Arc::new(redis), metrics)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to connect to Redis: {}. Using NullCache and in-memory metrics.",
                        e
                    );
                    (
                        Arc::new(NullCache::new()),
                        Arc::new(MemoryMetricsStore::new()),
                    )
                }
            },
            None => {
                tracing::info!("Cache disabled (NullCache), metrics kept in memory");
                (
                    Arc::new(NullCache::new()),
                    Arc::new(MemoryMetricsStore::new()),
                )
            }
        };

    Backends {
        links: Arc::new(PgLinkRepository::new(pool.clone())),
        aggregates: Arc::new(PgClickAggregateRepository::new(pool)),
        cache,
        metrics_store,
        geoip: geoip::from_path(config.geoip_db_path.as_deref()),
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache and metrics store (or in-process fallbacks)
/// - GeoIP reader
/// - Background click worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    let backends = build_backends(&config, pool).await;

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        Arc::new(backends.aggregation()),
        config.click_worker_concurrency,
    ));

    let state = AppState::new(&backends, &Settings::from_config(&config), click_tx);
    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router held the last sender; the worker drains what is queued and exits.
    if let Err(e) = worker.await {
        tracing::error!("Click worker terminated abnormally: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
