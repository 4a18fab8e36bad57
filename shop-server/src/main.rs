//! shop-server — order / stock-reservation backend
//!
//! Long-running service that:
//! - Serves the order API (create, list, cancel) over JWT-authenticated HTTP
//! - Runs the two-phase stock reservation pipeline (Redis cache + PostgreSQL)
//! - Accepts payment gateway callbacks (idempotent)
//! - Sweeps timed-out pending orders on a fixed interval

use tokio_util::sync::CancellationToken;

use shop_server::config::Config;
use shop_server::state::AppState;
use shop_server::api;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting shop-server (env: {})", config.environment);

    let shutdown = CancellationToken::new();

    // Initialize application state (PostgreSQL + migrations + Redis)
    let state = AppState::new(&config, shutdown.clone()).await?;

    // Optional cache warm-up from durable stock
    if config.sync_stock_on_startup {
        match state.stock.sync_stock_to_cache(None).await {
            Ok(synced) => tracing::info!(synced, "startup stock sync complete"),
            Err(e) => tracing::error!("startup stock sync failed: {e}"),
        }
    }

    // Periodic timeout reconciliation
    tokio::spawn(state.reconciler.clone().run());

    // Start HTTP server
    let app = api::create_router(state);
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("shop-server HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Wait for Ctrl-C, then cancel background tasks
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
