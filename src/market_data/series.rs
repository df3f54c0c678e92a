use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{Bar, SymbolMeta};

// ---------------------------------------------------------------------------
// SeriesStore -- thread-safe date-sorted history per symbol
// ---------------------------------------------------------------------------

struct SymbolSeries {
    meta: SymbolMeta,
    bars: Vec<Bar>,
}

/// Thread-safe store holding one chronologically ordered series per symbol.
/// Whole series are replaced on (re)load; only the last bar is ever mutated
/// in place, by the live simulation.
#[derive(Default)]
pub struct SeriesStore {
    series: RwLock<HashMap<String, SymbolSeries>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the series for `meta.symbol`. Bars are sorted by
    /// date before storing.
    pub fn insert(&self, meta: SymbolMeta, mut bars: Vec<Bar>) {
        bars.sort_by_key(|b| b.date);
        let key = meta.symbol.clone();
        self.series.write().insert(key, SymbolSeries { meta, bars });
    }

    /// Clone of every bar for `symbol` (oldest-first), if loaded.
    pub fn bars(&self, symbol: &str) -> Option<Vec<Bar>> {
        self.series.read().get(symbol).map(|s| s.bars.clone())
    }

    pub fn meta(&self, symbol: &str) -> Option<SymbolMeta> {
        self.series.read().get(symbol).map(|s| s.meta.clone())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.read().contains_key(symbol)
    }

    /// All loaded symbols, sorted alphabetically.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.series.read().keys().cloned().collect();
        out.sort();
        out
    }

    /// Metadata for every loaded symbol, sorted by symbol.
    pub fn all_meta(&self) -> Vec<SymbolMeta> {
        let mut out: Vec<SymbolMeta> = self
            .series
            .read()
            .values()
            .map(|s| s.meta.clone())
            .collect();
        out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        out
    }

    /// Mutate the last bar of `symbol` in place and return a copy of it.
    pub fn update_last<F>(&self, symbol: &str, f: F) -> Option<Bar>
    where
        F: FnOnce(&mut Bar),
    {
        let mut map = self.series.write();
        let last = map.get_mut(symbol)?.bars.last_mut()?;
        f(last);
        Some(last.clone())
    }
}
