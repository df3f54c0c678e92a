// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn on the
// dashboard. Series functions return vectors aligned to the input closes with
// `None` before warm-up, so a chart can plot them against the same x-axis.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

use self::bollinger::{bollinger_bands, BollingerSeries};
use self::macd::{calculate_macd, MacdSeries};
use self::rsi::rsi_aligned;
use self::sma::moving_average;

/// Place `values` at `start..` inside a `len`-long vector of `None`.
pub(crate) fn align(values: &[f64], start: usize, len: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; len];
    for (i, &v) in values.iter().enumerate() {
        let Some(idx) = start.checked_add(i) else { break };
        match out.get_mut(idx) {
            Some(slot) => *slot = Some(v),
            None => break,
        }
    }
    out
}

fn default_ma_windows() -> Vec<usize> {
    vec![20, 50, 200]
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

/// Look-back periods for every indicator on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_windows: default_ma_windows(),
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_k: default_bollinger_k(),
        }
    }
}

/// Longest look-back window accepted from configuration.
pub const MAX_WINDOW: usize = 10_000;

impl IndicatorParams {
    /// Replace out-of-range periods with their defaults.
    ///
    /// Windows must lie in `1..=MAX_WINDOW`; MA windows are deduplicated and
    /// an empty list falls back to 20/50/200.
    pub fn normalise(&mut self) {
        let defaults = Self::default();
        let valid = |w: usize| (1..=MAX_WINDOW).contains(&w);

        let mut windows: Vec<usize> = Vec::with_capacity(self.ma_windows.len());
        for &w in &self.ma_windows {
            if valid(w) && !windows.contains(&w) {
                windows.push(w);
            }
        }
        self.ma_windows = if windows.is_empty() { defaults.ma_windows } else { windows };

        if !valid(self.rsi_period) {
            self.rsi_period = defaults.rsi_period;
        }
        if !valid(self.macd_fast) || !valid(self.macd_slow) || self.macd_fast >= self.macd_slow {
            self.macd_fast = defaults.macd_fast;
            self.macd_slow = defaults.macd_slow;
        }
        if !valid(self.macd_signal) {
            self.macd_signal = defaults.macd_signal;
        }
        if !valid(self.bollinger_period) {
            self.bollinger_period = defaults.bollinger_period;
        }
        if !self.bollinger_k.is_finite() || self.bollinger_k <= 0.0 {
            self.bollinger_k = defaults.bollinger_k;
        }
    }
}

/// One moving-average line.
#[derive(Debug, Clone, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// Every indicator for one series, aligned to its bars.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    pub moving_averages: Vec<MovingAverage>,
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
}

impl IndicatorSet {
    /// Compute all indicators over the full `closes` series.
    pub fn compute(closes: &[f64], params: &IndicatorParams) -> Self {
        let moving_averages = params
            .ma_windows
            .iter()
            .map(|&window| MovingAverage {
                window,
                values: moving_average(closes, window),
            })
            .collect();

        Self {
            moving_averages,
            rsi: rsi_aligned(closes, params.rsi_period),
            macd: calculate_macd(
                closes,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            ),
            bollinger: bollinger_bands(closes, params.bollinger_period, params.bollinger_k),
        }
    }

    /// Restrict every series to the inclusive index range `i0..=i1`.
    pub fn slice(&self, i0: usize, i1: usize) -> Self {
        let cut = |v: &Vec<Option<f64>>| -> Vec<Option<f64>> {
            let end = (i1 + 1).min(v.len());
            let start = i0.min(end);
            v[start..end].to_vec()
        };

        Self {
            moving_averages: self
                .moving_averages
                .iter()
                .map(|ma| MovingAverage {
                    window: ma.window,
                    values: cut(&ma.values),
                })
                .collect(),
            rsi: cut(&self.rsi),
            macd: MacdSeries {
                macd: cut(&self.macd.macd),
                signal: cut(&self.macd.signal),
                histogram: cut(&self.macd.histogram),
            },
            bollinger: BollingerSeries {
                upper: cut(&self.bollinger.upper),
                middle: cut(&self.bollinger.middle),
                lower: cut(&self.bollinger.lower),
            },
        }
    }

    /// Moving-average line for `window`, if configured.
    pub fn moving_average(&self, window: usize) -> Option<&[Option<f64>]> {
        self.moving_averages
            .iter()
            .find(|ma| ma.window == window)
            .map(|ma| ma.values.as_slice())
    }
}
