//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::services::{LinkService, RedirectService, SessionService};
use crate::config::{Config, StorageBackend};
use crate::domain::event_worker::run_event_worker;
use crate::domain::repositories::{AnalyticsSink, LinkRepository, SessionRepository};
use crate::domain::resolver::RedirectResolver;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    MemoryAnalyticsSink, MemoryLinkRepository, MemorySessionRepository, PgAnalyticsSink,
    PgLinkRepository, PgSessionRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The three storage collaborators, behind their traits.
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub sink: Arc<dyn AnalyticsSink>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            sink: Arc::new(PgAnalyticsSink::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
        }
    }

    /// In-process repositories; data is lost on exit.
    pub fn memory() -> Self {
        Self {
            links: Arc::new(MemoryLinkRepository::new()),
            sink: Arc::new(MemoryAnalyticsSink::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
        }
    }
}

/// Wires services around `repositories` and spawns the event worker.
///
/// Returns the state together with the worker handle; the worker exits once
/// every clone of the state (and so every event sender) is dropped.
pub fn build_state(
    config: &Config,
    repositories: Repositories,
    cache: Arc<dyn CacheService>,
) -> (AppState, JoinHandle<()>) {
    let (event_sender, event_receiver) = mpsc::channel(config.event_queue_capacity);

    let worker = tokio::spawn(run_event_worker(
        event_receiver,
        repositories.links.clone(),
        repositories.sink.clone(),
        config.event_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.event_worker_concurrency,
        "Event worker started"
    );

    let redirect_service = Arc::new(RedirectService::new(
        repositories.links.clone(),
        cache.clone(),
        RedirectResolver::new(config.resolver_config()),
        event_sender.clone(),
    ));
    let link_service = Arc::new(LinkService::new(
        repositories.links,
        repositories.sink.clone(),
        config.public_base_url.clone(),
    ));
    let session_service = Arc::new(SessionService::new(
        repositories.sessions,
        config.session_signing_secret.clone(),
    ));

    let state = AppState {
        redirect_service,
        link_service,
        session_service,
        analytics_sink: repositories.sink,
        cache,
        event_sender,
    };

    (state, worker)
}

/// Opens the connection pool configured by `config`.
///
/// # Errors
///
/// Returns an error if no database URL is configured or the connection fails.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres storage backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations (or in-memory storage)
/// - Redis cache (or NullCache fallback)
/// - Background event worker
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = connect_pool(&config).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Repositories::postgres(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Repositories::memory()
        }
    };

    let cache = connect_cache(&config).await;
    let (state, worker) = build_state(&config, repositories, cache);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Dropping the server dropped the last event sender; let the worker drain.
    if let Err(e) = worker.await {
        tracing::error!("Event worker terminated abnormally: {}", e);
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
