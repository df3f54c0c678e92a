// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(fast) - EMA(slow)
//   Signal    = EMA(signal) of the MACD line
//   Histogram = MACD line - Signal
//
// With the usual 12/26/9 parameters the MACD line exists from index 25 and the
// signal line from index 33.
// =============================================================================

use serde::Serialize;

use super::align;
use super::ema::{calculate_ema, ema_aligned};

/// MACD output aligned to the input closes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    fn empty(len: usize) -> Self {
        Self {
            macd: vec![None; len],
            signal: vec![None; len],
            histogram: vec![None; len],
        }
    }

    /// Latest (macd, signal, histogram) triple where all three are defined.
    pub fn last(&self) -> Option<(f64, f64, f64)> {
        let idx = self.histogram.iter().rposition(Option::is_some)?;
        Some((self.macd[idx]?, self.signal[idx]?, self.histogram[idx]?))
    }
}

/// Compute MACD, signal and histogram for `closes`.
///
/// Requires non-zero periods and `fast < slow`; otherwise every entry is
/// `None`. Short inputs simply produce fewer defined values.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let len = closes.len();
    if fast == 0 || slow == 0 || signal == 0 || fast >= slow {
        return MacdSeries::empty(len);
    }

    let fast_ema = ema_aligned(closes, fast);
    let slow_ema = ema_aligned(closes, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // The MACD line is contiguous from `slow - 1` until the first gap.
    let macd_start = slow.saturating_sub(1);
    let compact: Vec<f64> = macd
        .iter()
        .skip(macd_start)
        .map_while(|v| *v)
        .collect();

    let signal_compact = calculate_ema(&compact, signal);
    let signal_line = align(
        &signal_compact,
        macd_start.saturating_add(signal).saturating_sub(1),
        len,
    );

    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn macd_invalid_periods_all_none() {
        let closes = ramp(60);
        let out = calculate_macd(&closes, 26, 12, 9);
        assert_eq!(out.macd.len(), 60);
        assert!(out.macd.iter().all(Option::is_none));
        assert!(calculate_macd(&closes, 0, 26, 9).signal.iter().all(Option::is_none));
    }

    #[test]
    fn macd_warmup_indices() {
        let closes = ramp(60);
        let out = calculate_macd(&closes, 12, 26, 9);
        assert!(out.macd[..25].iter().all(Option::is_none));
        assert!(out.macd[25..].iter().all(Option::is_some));
        assert!(out.signal[..33].iter().all(Option::is_none));
        assert!(out.signal[33..].iter().all(Option::is_some));
        assert_eq!(
            out.histogram.iter().filter(|v| v.is_some()).count(),
            60 - 33
        );
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let closes = vec![50.0; 80];
        let out = calculate_macd(&closes, 12, 26, 9);
        let (m, s, h) = out.last().unwrap();
        assert!(m.abs() < 1e-10);
        assert!(s.abs() < 1e-10);
        assert!(h.abs() < 1e-10);
    }

    #[test]
    fn macd_rising_series_is_positive() {
        let closes = ramp(100);
        let (m, _, _) = calculate_macd(&closes, 12, 26, 9).last().unwrap();
        assert!(m > 0.0);
    }

    #[test]
    fn macd_histogram_is_difference() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 / 7.0).sin() * 10.0).collect();
        let out = calculate_macd(&closes, 12, 26, 9);
        for i in 0..closes.len() {
            if let (Some(m), Some(s), Some(h)) = (out.macd[i], out.signal[i], out.histogram[i]) {
                assert!((h - (m - s)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_short_input_has_no_signal() {
        let closes = ramp(30);
        let out = calculate_macd(&closes, 12, 26, 9);
        assert!(out.macd[25].is_some());
        assert!(out.signal.iter().all(Option::is_none));
        assert!(out.last().is_none());
    }

    #[test]
    fn macd_huge_signal_period_has_no_signal() {
        let closes = ramp(60);
        let out = calculate_macd(&closes, 12, 26, usize::MAX);
        assert_eq!(out.signal.len(), 60);
        assert!(out.signal.iter().all(Option::is_none));
        assert!(out.histogram.iter().all(Option::is_none));
        assert!(out.macd[25].is_some());
    }
}
