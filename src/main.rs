use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;

mod api;
mod app_state;
mod config;
mod db;
mod middleware;
mod payment;
mod utils;
mod workflow;

use crate::app_state::AppState;
use crate::config::Config;
use crate::db::pool::{get_db_pool, PgStore};
use crate::payment::stripe::StripeGateway;
use crate::workflow::schema::{refresh_capabilities, Capabilities};

/// Stdout by default, a daily rolling file under `LOG_DIR` when set. The
/// returned guard flushes the file writer and must outlive the server.
fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "procurement.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_max_level(level).with_target(true).init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _log_guard = init_tracing(&config)?;

    let pool = get_db_pool(&config).await.context("Failed to connect to the database")?;

    let capabilities = Arc::new(Capabilities::default());
    let store = Arc::new(PgStore::new(pool.clone(), capabilities.clone()));
    if refresh_capabilities(store.as_ref(), &capabilities).await {
        info!("payment tracking enabled");
    } else {
        warn!("payment tracking disabled; payments are not recorded locally");
    }

    let gateway = Arc::new(StripeGateway::from_config(&config)?);
    let addr = config.listen_addr();
    let state = AppState::new(config, store, gateway, capabilities);
    let app = api::router(state);

    let listener = TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool))
        .await
        .context("Server encountered an error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(pool: PgPool) {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, closing database pool");
    pool.close().await;
    info!("Database pool closed, server shutting down");
}
