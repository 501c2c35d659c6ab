use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use domain::services::TracingNotifier;
use domain::store::TicketStore;
use persistence::{MemoryTicketStore, PgTicketStore};
use tracing::{info, warn};

use ticketing_api::app::{self, AppState};
use ticketing_api::config::{Config, StorageBackend};
use ticketing_api::jobs::{CacheSweepJob, JobScheduler, PoolMetricsJob};
use ticketing_api::middleware;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting ticketing API v{}", env!("CARGO_PKG_VERSION"));

    let jwt = config.jwt.build().context("Invalid JWT configuration")?;
    let lock_timeout = config.booking.lock_timeout();
    let mut scheduler = JobScheduler::new();

    let store: Arc<dyn TicketStore> = match config.storage.backend {
        StorageBackend::Postgres => {
            let db_config: persistence::db::DatabaseConfig = (&config.database).into();
            let pool = persistence::db::create_pool(&db_config).await?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            scheduler.register(PoolMetricsJob::new(
                pool.clone(),
                db_config.max_connections,
            ));
            Arc::new(PgTicketStore::new(pool, lock_timeout))
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store; transactions are serialized store-wide and data is lost on restart");
            Arc::new(MemoryTicketStore::new(lock_timeout))
        }
    };

    let addr = config.socket_addr();
    let state = AppState::new(config, store, jwt, Arc::new(TracingNotifier));
    if state.event_cache.is_enabled() {
        scheduler.register(CacheSweepJob::new(state.event_cache.clone()));
    }
    scheduler.start();

    let app = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(5)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
