// =============================================================================
// Runtime Configuration — dashboard settings with atomic save
// =============================================================================
//
// Every tunable lives here: watched symbols, data sources, the live simulation
// and indicator periods. All fields carry `#[serde(default)]` so that adding a
// field never breaks loading an older config file. Persistence writes a `.tmp`
// sibling and renames it over the target.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorParams;
use crate::market_data::{stooq, synthetic};
use crate::types::LiveMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec![
        "NVDA".to_string(),
        "AAPL".to_string(),
        "TSLA".to_string(),
        "MSFT".to_string(),
        "BTC-USD".to_string(),
    ]
}

fn default_active_symbol() -> String {
    "NVDA".to_string()
}

fn default_stooq_base_url() -> String {
    stooq::DEFAULT_BASE_URL.to_string()
}

fn default_snapshot_path() -> String {
    "stocks.json".to_string()
}

fn default_fallback_days() -> u32 {
    synthetic::DEFAULT_DAYS
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_volatility() -> f64 {
    0.005
}

fn default_volume_step() -> f64 {
    50_000.0
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the dashboard backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Symbols ------------------------------------------------------------

    /// Symbols loaded at startup and on reload.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Symbol shown on the dashboard and advanced by the live simulation.
    #[serde(default = "default_active_symbol")]
    pub active_symbol: String,

    // --- Data sources -------------------------------------------------------

    /// Base URL of the Stooq-compatible CSV endpoint.
    #[serde(default = "default_stooq_base_url")]
    pub stooq_base_url: String,

    /// Exported JSON snapshot; entries found here skip the network.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Calendar days covered by the synthetic fallback series.
    #[serde(default = "default_fallback_days")]
    pub fallback_days: u32,

    // --- Live simulation ----------------------------------------------------

    #[serde(default)]
    pub live_mode: LiveMode,

    /// Period of the simulation timer in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Maximum relative close move per tick (0.005 = ±0.5 %).
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Upper bound of the volume added per tick.
    #[serde(default = "default_volume_step")]
    pub volume_step: f64,

    // --- Indicators ---------------------------------------------------------

    #[serde(default)]
    pub indicator_params: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            active_symbol: default_active_symbol(),
            stooq_base_url: default_stooq_base_url(),
            snapshot_path: default_snapshot_path(),
            fallback_days: default_fallback_days(),
            live_mode: LiveMode::Stopped,
            tick_interval_ms: default_tick_interval_ms(),
            volatility: default_volatility(),
            volume_step: default_volume_step(),
            indicator_params: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            live_mode = %config.live_mode,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Make sure the active symbol is one of the configured symbols.
    pub fn normalise(&mut self) {
        let mut symbols: Vec<String> = Vec::with_capacity(self.symbols.len());
        for s in self.symbols.iter().map(|s| s.trim().to_uppercase()) {
            if !s.is_empty() && !symbols.contains(&s) {
                symbols.push(s);
            }
        }
        self.symbols = symbols;
        if self.symbols.is_empty() {
            self.symbols = default_symbols();
        }
        self.active_symbol = self.active_symbol.trim().to_uppercase();
        if !self.symbols.contains(&self.active_symbol) {
            self.active_symbol = self.symbols[0].clone();
        }
        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = default_tick_interval_ms();
        }
        self.indicator_params.normalise();
    }
}
