// =============================================================================
// Date-range selection
// =============================================================================
//
// The dashboard selects a sub-range of a series with two percentage sliders.
// Percentages map onto indices of the full series:
//
//   i0 = clamp(floor(start% / 100 * (n - 1)), 0, n - 1)
//   i1 = clamp(floor(end%   / 100 * (n - 1)), i0, n - 1)
//
// Crossed sliders are swapped rather than rejected.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Slider positions in percent of the full series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRange {
    pub start_pct: f64,
    pub end_pct: f64,
}

impl Default for ViewRange {
    fn default() -> Self {
        Self {
            start_pct: 0.0,
            end_pct: 100.0,
        }
    }
}

impl ViewRange {
    /// Build a range, clamping both ends to 0..=100 and swapping if crossed.
    pub fn new(start_pct: f64, end_pct: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        let (s, e) = (clamp(start_pct), clamp(end_pct));
        if s > e {
            Self { start_pct: e, end_pct: s }
        } else {
            Self { start_pct: s, end_pct: e }
        }
    }

    /// Inclusive index range into a series of length `n`.
    pub fn indices(&self, n: usize) -> Option<(usize, usize)> {
        slice_range(n, self.start_pct, self.end_pct)
    }
}

/// Map slider percentages onto an inclusive `(i0, i1)` index pair.
///
/// Returns `None` for an empty series.
pub fn slice_range(n: usize, pct_start: f64, pct_end: f64) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }

    let (ps, pe) = if pct_start > pct_end {
        (pct_end, pct_start)
    } else {
        (pct_start, pct_end)
    };

    let last = n - 1;
    let to_index = |pct: f64| -> usize {
        let raw = ((pct / 100.0) * last as f64).floor();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            (raw as usize).min(last)
        }
    };

    let i0 = to_index(ps);
    let i1 = to_index(pe).max(i0);
    Some((i0, i1))
}
