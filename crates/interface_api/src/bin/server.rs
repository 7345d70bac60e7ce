//! Collision Claims Core - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (in-memory storage)
//! cargo run --bin claims-api
//!
//! # Persist to files
//! API_STORAGE_BACKEND=file API_DATA_DIR=./data cargo run --bin claims-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_STORAGE_BACKEND` - memory, file or postgres (default: memory)
//! * `API_DATA_DIR` - Directory for the file backend (default: ./data)
//! * `API_DATABASE_URL` - PostgreSQL connection string for the postgres backend
//! * `API_CACHE_TTL_SECS` - Claim cache lifetime (default: 30)
//! * `API_FLUSH_INTERVAL_MS` - Claim write-back period, 0 writes through (default: 0)
//! * `API_ANALYSIS_LATENCY_MS` - Simulated damage-analysis latency (default: 2000)
//! * `API_RNG_SEED` - Fixed seed for the mock services
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{KeyValueStore, LoggingNotifier, MemoryKeyValueStore};
use infra_db::{create_pool, ensure_schema, DatabaseConfig, FileKeyValueStore, PostgresKeyValueStore};
use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_ configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.storage_backend,
        "Starting Collision Claims API Server"
    );

    let storage = open_storage(&config).await?;
    let state = AppState::new(config.clone(), storage, Arc::new(LoggingNotifier));
    let flush_task = state.claims.spawn_flush_task();

    let app = create_router(state.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = flush_task {
        task.abort();
    }
    state.claims.flush().await.context("final claim flush failed")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn open_storage(config: &ApiConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let storage: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryKeyValueStore::new()),
        StorageBackend::File => {
            let store = FileKeyValueStore::open(&config.data_dir)
                .await
                .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
            Arc::new(store)
        }
        StorageBackend::Postgres => {
            let pool = create_pool(DatabaseConfig::new(config.database_url.clone()))
                .await
                .context("database connection failed")?;
            ensure_schema(&pool).await.context("schema setup failed")?;
            Arc::new(PostgresKeyValueStore::new(pool))
        }
    };
    Ok(storage)
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
