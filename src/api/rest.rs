// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Reads are side-effect free; every
// mutating endpoint bumps the state version so WebSocket clients pick the
// change up on their next push tick.
//
// CORS is permissive: the dashboard front end is served from elsewhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::dashboard::ViewRange;
use crate::indicators::IndicatorSet;
use crate::types::{Bar, LiveMode, SymbolMeta};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Reads ───────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/series/:symbol", get(series))
        .route("/api/v1/indicators/:symbol", get(indicators))
        // ── View & live mode ────────────────────────────────────────
        .route("/api/v1/view", post(update_view))
        .route("/api/v1/view/reset", post(reset_view))
        .route("/api/v1/live/start", post(live_start))
        .route("/api/v1/live/stop", post(live_stop))
        // ── Data management ─────────────────────────────────────────
        .route("/api/v1/reload", post(reload))
        .route("/api/v1/export", post(export))
        // ── WebSocket ───────────────────────────────────────────────
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Reads
// =============================================================================

async fn symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.series.all_meta())
}

async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

#[derive(Serialize)]
struct SeriesResponse {
    meta: SymbolMeta,
    bars: Vec<Bar>,
}

async fn series(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let symbol = symbol.to_uppercase();
    let (Some(meta), Some(bars)) = (state.series.meta(&symbol), state.series.bars(&symbol)) else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("unknown symbol '{symbol}'"),
        ));
    };
    Ok(Json(SeriesResponse { meta, bars }))
}

#[derive(Serialize)]
struct IndicatorsResponse {
    symbol: String,
    /// UNIX seconds, aligned with every indicator vector.
    timestamps: Vec<i64>,
    indicators: IndicatorSet,
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorsResponse>, ApiError> {
    let symbol = symbol.to_uppercase();
    let bars = state.series.bars(&symbol).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, format!("unknown symbol '{symbol}'"))
    })?;

    let params = state.runtime_config.read().indicator_params.clone();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    Ok(Json(IndicatorsResponse {
        symbol,
        timestamps: bars.iter().map(Bar::timestamp).collect(),
        indicators: IndicatorSet::compute(&closes, &params),
    }))
}

// =============================================================================
// View
// =============================================================================

/// Partial view update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
struct ViewUpdate {
    symbol: Option<String>,
    start_pct: Option<f64>,
    end_pct: Option<f64>,
    ma20: Option<bool>,
    ma50: Option<bool>,
    ma200: Option<bool>,
}

async fn update_view(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ViewUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(symbol) = update.symbol.as_deref() {
        let symbol = symbol.trim().to_uppercase();
        if !state.series.contains(&symbol) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("unknown symbol '{symbol}'"),
            ));
        }
        let changed = {
            let mut cfg = state.runtime_config.write();
            let changed = cfg.active_symbol != symbol;
            cfg.active_symbol = symbol.clone();
            changed
        };
        if changed {
            info!(symbol = %symbol, "active symbol changed via API");
            state.persist_config();
        }
    }

    let view = {
        let mut view = state.view.write();
        if update.start_pct.is_some() || update.end_pct.is_some() {
            view.range = ViewRange::new(
                update.start_pct.unwrap_or(view.range.start_pct),
                update.end_pct.unwrap_or(view.range.end_pct),
            );
        }
        if let Some(v) = update.ma20 {
            view.toggles.ma20 = v;
        }
        if let Some(v) = update.ma50 {
            view.toggles.ma50 = v;
        }
        if let Some(v) = update.ma200 {
            view.toggles.ma200 = v;
        }
        *view
    };
    state.increment_version();

    Ok(Json(serde_json::json!({
        "active_symbol": state.active_symbol(),
        "view": view,
    })))
}

async fn reset_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = {
        let mut view = state.view.write();
        view.range = ViewRange::default();
        *view
    };
    state.increment_version();
    Json(serde_json::json!({ "view": view }))
}

// =============================================================================
// Live mode
// =============================================================================

#[derive(Serialize)]
struct LiveResponse {
    live_mode: LiveMode,
    message: &'static str,
}

async fn live_start(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.set_live_mode(LiveMode::Running);
    Json(LiveResponse {
        live_mode: LiveMode::Running,
        message: "Live simulation started",
    })
}

async fn live_stop(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.set_live_mode(LiveMode::Stopped);
    Json(LiveResponse {
        live_mode: LiveMode::Stopped,
        message: "Live simulation stopped",
    })
}

// =============================================================================
// Data management
// =============================================================================

async fn reload(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let fallbacks = state.reload_all().await.map_err(|e| {
        warn!(error = %e, "reload failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;

    Ok(Json(serde_json::json!({
        "symbols": state.series.symbols(),
        "fallbacks": fallbacks,
    })))
}

async fn export(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let exported = state.export_snapshot().map_err(|e| {
        state.push_error(format!("export failed: {e:#}"));
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;

    let path = state.runtime_config.read().snapshot_path.clone();
    Ok(Json(serde_json::json!({
        "path": path,
        "symbols": exported,
    })))
}

// =============================================================================
// Tests
// =============================================================================
