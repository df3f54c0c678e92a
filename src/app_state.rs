// =============================================================================
// Central Application State — stock dashboard backend
// =============================================================================
//
// The single source of truth shared by the REST handlers, the WebSocket feed
// and the live simulation loop. AppState also builds the serialisable
// snapshot that both the REST API and the WebSocket push.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the config, view and error ring.
//   - SeriesStore manages its own interior mutability.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dashboard::{build_dashboard, DashboardView, ViewState};
use crate::market_data::snapshot::{export_entry, load_snapshot, save_snapshot, ExportFile};
use crate::market_data::{load_symbol, SeriesStore, Snapshot, StooqClient};
use crate::runtime_config::RuntimeConfig;
use crate::types::{LiveMode, SymbolMeta};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented on every meaningful mutation. The WebSocket feed compares
    /// it against the last version it sent.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: RwLock<RuntimeConfig>,
    /// Where `runtime_config` is persisted; `None` disables saving.
    pub config_path: Option<PathBuf>,

    // ── Market Data ─────────────────────────────────────────────────────
    pub series: SeriesStore,

    // ── View ────────────────────────────────────────────────────────────
    pub view: RwLock<ViewState>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: RwLock::new(config),
            config_path,
            series: SeriesStore::new(),
            view: RwLock::new(ViewState::default()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version, returning the previous value.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message; the oldest entries are evicted past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Config ──────────────────────────────────────────────────────────

    pub fn active_symbol(&self) -> String {
        self.runtime_config.read().active_symbol.clone()
    }

    pub fn live_mode(&self) -> LiveMode {
        self.runtime_config.read().live_mode
    }

    pub fn set_live_mode(&self, mode: LiveMode) {
        self.runtime_config.write().live_mode = mode;
        info!(live_mode = %mode, "live mode changed");
        self.increment_version();
        self.persist_config();
    }

    /// Save the runtime config if a path is configured. Failures are logged
    /// and recorded, never propagated.
    pub fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        let config = self.runtime_config.read().clone();
        if let Err(e) = config.save(path) {
            warn!(error = %e, "failed to persist runtime config");
            self.push_error(format!("config save failed: {e:#}"));
        }
    }

    // ── Data loading ────────────────────────────────────────────────────

    /// Load every configured symbol through the snapshot / remote /
    /// synthetic chain and replace the stored series.
    ///
    /// Returns the number of symbols that had to fall back to synthetic data.
    pub async fn reload_all(&self) -> Result<usize> {
        let (symbols, base_url, snapshot_path, fallback_days) = {
            let cfg = self.runtime_config.read();
            (
                cfg.symbols.clone(),
                cfg.stooq_base_url.clone(),
                cfg.snapshot_path.clone(),
                cfg.fallback_days,
            )
        };

        let client = StooqClient::new(base_url)?;
        let snapshot: Option<Snapshot> = match load_snapshot(&snapshot_path) {
            Ok(s) => Some(s),
            Err(e) => {
                info!(path = %snapshot_path, error = %e, "no usable snapshot, fetching remote data");
                None
            }
        };

        let mut rng = StdRng::from_entropy();
        let mut fallbacks = 0;
        for symbol in &symbols {
            let loaded =
                load_symbol(symbol, snapshot.as_ref(), &client, fallback_days, &mut rng).await;
            if let Some(err) = loaded.fallback_error {
                fallbacks += 1;
                self.push_error(err);
            }
            debug!(symbol = %symbol, source = %loaded.meta.source, bars = loaded.bars.len(), "series stored");
            self.series.insert(loaded.meta, loaded.bars);
        }

        info!(symbols = symbols.len(), fallbacks, "series reload complete");
        self.increment_version();
        Ok(fallbacks)
    }

    /// Write every stored series to the snapshot file. Returns the number of
    /// symbols exported.
    pub fn export_snapshot(&self) -> Result<usize> {
        let path = self.runtime_config.read().snapshot_path.clone();

        let mut snapshot = ExportFile::new();
        for meta in self.series.all_meta() {
            if let Some(bars) = self.series.bars(&meta.symbol) {
                let entry = export_entry(&meta.symbol, meta.long_name, &bars);
                snapshot.insert(meta.symbol, entry);
            }
        }

        save_snapshot(&path, &snapshot)
            .with_context(|| format!("failed to export snapshot to {path}"))?;
        info!(path = %path, symbols = snapshot.len(), "snapshot exported");
        Ok(snapshot.len())
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the complete dashboard snapshot for the active symbol and view.
    ///
    /// Payload of `GET /api/v1/dashboard` and every WebSocket push.
    pub fn build_snapshot(&self) -> DashboardSnapshot {
        let now = Utc::now();
        let version = self.current_state_version();

        let (active_symbol, live_mode, params) = {
            let cfg = self.runtime_config.read();
            (cfg.active_symbol.clone(), cfg.live_mode, cfg.indicator_params.clone())
        };
        let view = *self.view.read();

        let dashboard = self
            .series
            .bars(&active_symbol)
            .and_then(|bars| build_dashboard(&active_symbol, &bars, &view, &params));

        DashboardSnapshot {
            state_version: version,
            server_time: now.timestamp_millis(),
            active_symbol,
            symbols: self.series.all_meta(),
            live_mode,
            view,
            dashboard,
            recent_errors: self.recent_errors.read().clone(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

// =============================================================================
// Serialisable snapshot
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub active_symbol: String,
    pub symbols: Vec<SymbolMeta>,
    pub live_mode: LiveMode,
    pub view: ViewState,
    /// Absent until the active symbol has been loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardView>,
    pub recent_errors: Vec<ErrorRecord>,
    pub uptime_secs: u64,
}
