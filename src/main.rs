//! Throttle Cache server binary
//!
//! Rate-limited, cached product API in front of a deliberately slow catalog.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use throttle_cache::api::{create_router, AppState};
use throttle_cache::config::{Config, StoreBackend};
use throttle_cache::store::{KvStore, MemoryStore, RedisStore};
use throttle_cache::tasks::spawn_cleanup_task;

/// Main entry point for the server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables and `.env`
/// 3. Connect the shared store (Redis, or in-memory with its sweep task)
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port, exposing peer addresses
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "throttle_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Throttle Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, port={}, cache_ttl={}s, upstream_latency={}ms, development={}",
        config.store_backend,
        config.server_port,
        config.cache_ttl,
        config.upstream_latency_ms,
        config.development
    );

    let (store, sweeper): (Arc<dyn KvStore>, Option<JoinHandle<()>>) = match config.store_backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url, config.store_max_retries)
                .await
                .context("failed to connect to Redis")?;
            let store: Arc<dyn KvStore> = Arc::new(store);
            (store, None)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; limits and cache are not shared between processes");
            let store = MemoryStore::new();
            let sweeper = spawn_cleanup_task(store.clone(), config.cleanup_interval);
            let store: Arc<dyn KvStore> = Arc::new(store);
            (store, Some(sweeper))
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = create_router(AppState::from_config(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(sweeper))
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task if one is running.
async fn shutdown_signal(sweeper: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
        warn!("Expiry sweep task aborted");
    }
}
