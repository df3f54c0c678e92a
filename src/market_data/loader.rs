// =============================================================================
// Symbol loader: snapshot -> remote CSV -> synthetic fallback
// =============================================================================

use anyhow::Result;
use chrono::Local;
use rand::Rng;
use tracing::{info, warn};

use super::snapshot::Snapshot;
use super::stooq::StooqClient;
use super::synthetic;
use crate::types::{Bar, DataSource, SymbolMeta};

/// A loaded series plus the error that forced a fallback, if any.
pub struct Loaded {
    pub meta: SymbolMeta,
    pub bars: Vec<Bar>,
    pub fallback_error: Option<String>,
}

/// Resolve one symbol's history.
///
/// A non-empty snapshot entry wins; otherwise the daily CSV is fetched. Any
/// fetch or parse failure, or an empty result, falls back to a synthetic
/// random walk so the dashboard always has data.
pub async fn load_symbol<R: Rng>(
    symbol: &str,
    snapshot: Option<&Snapshot>,
    client: &StooqClient,
    fallback_days: u32,
    rng: &mut R,
) -> Loaded {
    if let Some(entry) = snapshot.and_then(|s| s.get(symbol)) {
        if !entry.data.is_empty() {
            info!(symbol, bars = entry.data.len(), "series loaded from snapshot");
            return Loaded {
                meta: SymbolMeta {
                    symbol: symbol.to_string(),
                    long_name: entry.meta.long_name.clone(),
                    last_updated: entry.meta.last_updated.clone(),
                    source: DataSource::Snapshot,
                },
                bars: entry.data.clone(),
                fallback_error: None,
            };
        }
    }

    match fetch_non_empty(client, symbol).await {
        Ok(bars) => {
            info!(symbol, bars = bars.len(), "series loaded from remote CSV");
            Loaded {
                meta: SymbolMeta {
                    last_updated: Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                    ..SymbolMeta::new(symbol, DataSource::Remote)
                },
                bars,
                fallback_error: None,
            }
        }
        Err(e) => {
            warn!(symbol, error = %e, "using fallback synthetic data due to fetch error");
            let bars = synthetic::generate(Local::now().date_naive(), fallback_days, rng);
            Loaded {
                meta: SymbolMeta::new(symbol, DataSource::Synthetic),
                bars,
                fallback_error: Some(format!("{symbol}: {e:#}")),
            }
        }
    }
}

async fn fetch_non_empty(client: &StooqClient, symbol: &str) -> Result<Vec<Bar>> {
    let bars = client.fetch_daily(symbol).await?;
    if bars.is_empty() {
        anyhow::bail!("no rows in CSV for {symbol}");
    }
    Ok(bars)
}
