// =============================================================================
// Live price simulation
// =============================================================================
//
// A single repeating timer nudges the last bar of the active symbol so the
// dashboard moves between data loads:
//
//   close  = max(0.01, close * (1 + U[-volatility, volatility)))
//   high   = max(high, close)
//   low    = min(low, close)
//   volume += U[0, volume_step)
//
// The loop never exits; a Stopped live mode just skips ticks.
// =============================================================================

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::types::{Bar, LiveMode};

const MIN_PRICE: f64 = 0.01;

/// Random-walk stepper for the last bar of a series.
pub struct LiveSimulator {
    rng: StdRng,
    volatility: f64,
    volume_step: f64,
}

impl LiveSimulator {
    pub fn new(volatility: f64, volume_step: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), volatility, volume_step)
    }

    pub fn with_rng(rng: StdRng, volatility: f64, volume_step: f64) -> Self {
        Self {
            rng,
            volatility: volatility.abs(),
            volume_step: volume_step.max(0.0),
        }
    }

    /// Pick up changed settings without losing the RNG state.
    pub fn reconfigure(&mut self, volatility: f64, volume_step: f64) {
        self.volatility = volatility.abs();
        self.volume_step = volume_step.max(0.0);
    }

    /// Apply one simulated tick to `bar`.
    pub fn advance(&mut self, bar: &mut Bar) {
        let shock = if self.volatility > 0.0 {
            self.rng.gen_range(-self.volatility..self.volatility)
        } else {
            0.0
        };
        bar.close = (bar.close * (1.0 + shock)).max(MIN_PRICE);
        bar.high = bar.high.max(bar.close);
        bar.low = bar.low.min(bar.close);

        if self.volume_step > 0.0 {
            bar.volume += self.rng.gen_range(0.0..self.volume_step);
        }
    }
}

/// Drive the simulation until the process exits.
///
/// The tick period is read once at start; volatility and the active symbol
/// are re-read every tick.
pub async fn run_live_simulation(state: Arc<AppState>) {
    let (tick_ms, volatility, volume_step) = {
        let cfg = state.runtime_config.read();
        (cfg.tick_interval_ms.max(1), cfg.volatility, cfg.volume_step)
    };

    let mut sim = LiveSimulator::new(volatility, volume_step);
    let mut timer = interval(Duration::from_millis(tick_ms));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(tick_ms, volatility, "live simulation loop started");

    loop {
        timer.tick().await;

        let (mode, symbol, volatility, volume_step) = {
            let cfg = state.runtime_config.read();
            (
                cfg.live_mode,
                cfg.active_symbol.clone(),
                cfg.volatility,
                cfg.volume_step,
            )
        };
        if mode != LiveMode::Running {
            continue;
        }

        sim.reconfigure(volatility, volume_step);
        match state.series.update_last(&symbol, |bar| sim.advance(bar)) {
            Some(bar) => {
                debug!(symbol = %symbol, close = bar.close, volume = bar.volume, "live tick");
                state.increment_version();
            }
            None => debug!(symbol = %symbol, "live tick skipped: no series loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::types::{DataSource, SymbolMeta};
    use chrono::NaiveDate;

    fn bar(close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn close_moves_within_volatility_band() {
        let mut sim = LiveSimulator::with_rng(StdRng::seed_from_u64(5), 0.01, 10.0);
        let mut b = bar(100.0);
        for _ in 0..500 {
            let before = b.close;
            sim.advance(&mut b);
            let ratio = b.close / before;
            assert!((0.99..1.01).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn high_low_track_extremes() {
        let mut sim = LiveSimulator::with_rng(StdRng::seed_from_u64(11), 0.05, 0.0);
        let mut b = bar(50.0);
        let (mut hi, mut lo) = (50.0_f64, 50.0_f64);
        for _ in 0..200 {
            sim.advance(&mut b);
            hi = hi.max(b.close);
            lo = lo.min(b.close);
        }
        assert!((b.high - hi).abs() < 1e-12);
        assert!((b.low - lo).abs() < 1e-12);
        assert!((b.volume - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn volume_only_grows() {
        let mut sim = LiveSimulator::with_rng(StdRng::seed_from_u64(2), 0.01, 50_000.0);
        let mut b = bar(10.0);
        let mut prev = b.volume;
        for _ in 0..100 {
            sim.advance(&mut b);
            assert!(b.volume >= prev);
            assert!(b.volume - prev < 50_000.0);
            prev = b.volume;
        }
    }

    #[test]
    fn price_is_floored() {
        let mut sim = LiveSimulator::with_rng(StdRng::seed_from_u64(3), 0.9, 0.0);
        let mut b = bar(0.01);
        for _ in 0..100 {
            sim.advance(&mut b);
            assert!(b.close >= MIN_PRICE);
        }
    }

    #[test]
    fn zero_volatility_keeps_price() {
        let mut sim = LiveSimulator::with_rng(StdRng::seed_from_u64(4), 0.0, 0.0);
        let mut b = bar(42.0);
        sim.advance(&mut b);
        assert!((b.close - 42.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn loop_idles_while_stopped_and_advances_while_running() {
        let cfg = RuntimeConfig {
            tick_interval_ms: 10,
            ..RuntimeConfig::default()
        };
        let state = Arc::new(AppState::new(cfg, None));
        state
            .series
            .insert(SymbolMeta::new("NVDA", DataSource::Synthetic), vec![bar(100.0)]);

        let handle = tokio::spawn(run_live_simulation(state.clone()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(state.current_state_version(), 1);
        assert!(!handle.is_finished());

        state.set_live_mode(LiveMode::Running);
        let after_toggle = state.current_state_version();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(state.current_state_version() > after_toggle);
        assert!(!handle.is_finished());

        let last = state.series.bars("NVDA").unwrap()[0].clone();
        assert!(last.volume > 1_000.0);
        assert!(last.high >= last.close && last.low <= last.close);

        state.set_live_mode(LiveMode::Stopped);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stopped_at = state.current_state_version();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state.current_state_version(), stopped_at);
        assert!(!handle.is_finished());

        handle.abort();
    }
}
