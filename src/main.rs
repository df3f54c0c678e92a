// =============================================================================
// Stock Dashboard Backend — Main Entry Point
// =============================================================================
//
// Startup order: environment, config, initial data load (snapshot, remote CSV
// or synthetic fallback per symbol), live simulation loop, HTTP/WebSocket
// API. The live simulation always starts Stopped.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod dashboard;
mod indicators;
mod market_data;
mod runtime_config;
mod simulation;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;
use crate::types::LiveMode;

const CONFIG_PATH: &str = "dashboard_config.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Stock dashboard backend starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    config.live_mode = LiveMode::Stopped;

    if let Ok(syms) = std::env::var("DASHBOARD_SYMBOLS") {
        config.symbols = syms.split(',').map(str::to_string).collect();
    }
    if let Ok(path) = std::env::var("DASHBOARD_SNAPSHOT") {
        config.snapshot_path = path;
    }
    config.normalise();

    info!(
        symbols = ?config.symbols,
        active = %config.active_symbol,
        snapshot = %config.snapshot_path,
        "configured symbols"
    );

    // ── 2. Shared state & initial load ───────────────────────────────────
    let state = Arc::new(AppState::new(config, Some(PathBuf::from(CONFIG_PATH))));

    let fallbacks = state
        .reload_all()
        .await
        .context("initial data load failed")?;
    if fallbacks > 0 {
        warn!(fallbacks, "some symbols are using synthetic data");
    }

    // ── 3. Live simulation ───────────────────────────────────────────────
    tokio::spawn(simulation::run_live_simulation(state.clone()));

    // ── 4. API server ────────────────────────────────────────────────────
    let bind_addr =
        std::env::var("DASHBOARD_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "failed to save runtime config on shutdown");
    }

    info!("Stock dashboard backend shut down complete.");
    Ok(())
}
