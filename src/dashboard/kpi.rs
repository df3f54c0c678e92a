// =============================================================================
// KPI cards for the selected range
// =============================================================================

use serde::Serialize;

use crate::types::Bar;

/// Headline figures for the visible slice, raw and pre-formatted.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub min_close: f64,
    pub max_close: f64,
    pub avg_volume_millions: f64,
    pub total_return_pct: f64,
    /// `up` when the return is non-negative, `down` otherwise.
    pub trend: &'static str,
    pub min_label: String,
    pub max_label: String,
    pub volume_label: String,
    pub return_label: String,
    /// `YYYY-MM-DD → YYYY-MM-DD`
    pub range_label: String,
}

impl Kpis {
    /// Compute KPIs over `slice`. Returns `None` for an empty slice.
    pub fn compute(slice: &[Bar]) -> Option<Self> {
        let first = slice.first()?;
        let last = slice.last()?;

        let (min_close, max_close, vol_sum) = slice.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
            |(lo, hi, vol), b| (lo.min(b.close), hi.max(b.close), vol + b.volume),
        );

        let avg_volume_millions = vol_sum / slice.len() as f64 / 1_000_000.0;
        let total_return_pct = if first.close != 0.0 {
            (last.close - first.close) / first.close * 100.0
        } else {
            0.0
        };

        let sign = if total_return_pct > 0.0 { "+" } else { "" };

        Some(Self {
            min_close,
            max_close,
            avg_volume_millions,
            total_return_pct,
            trend: if total_return_pct >= 0.0 { "up" } else { "down" },
            min_label: format!("${min_close:.2}"),
            max_label: format!("${max_close:.2}"),
            volume_label: format!("{avg_volume_millions:.1}M"),
            return_label: format!("{sign}{total_return_pct:.2}%"),
            range_label: format!(
                "{} → {}",
                first.date.format("%Y-%m-%d"),
                last.date.format("%Y-%m-%d")
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64, volume: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn empty_slice_has_no_kpis() {
        assert!(Kpis::compute(&[]).is_none());
    }

    #[test]
    fn positive_return() {
        let slice = [bar(1, 100.0, 1_000_000.0), bar(2, 90.0, 2_000_000.0), bar(5, 110.0, 3_000_000.0)];
        let k = Kpis::compute(&slice).unwrap();
        assert!((k.min_close - 90.0).abs() < f64::EPSILON);
        assert!((k.max_close - 110.0).abs() < f64::EPSILON);
        assert!((k.avg_volume_millions - 2.0).abs() < 1e-12);
        assert!((k.total_return_pct - 10.0).abs() < 1e-10);
        assert_eq!(k.trend, "up");
        assert_eq!(k.min_label, "$90.00");
        assert_eq!(k.volume_label, "2.0M");
        assert_eq!(k.return_label, "+10.00%");
        assert_eq!(k.range_label, "2024-02-01 → 2024-02-05");
    }

    #[test]
    fn negative_return_has_no_plus() {
        let k = Kpis::compute(&[bar(1, 200.0, 1.0), bar(2, 150.0, 1.0)]).unwrap();
        assert_eq!(k.return_label, "-25.00%");
        assert_eq!(k.trend, "down");
    }

    #[test]
    fn flat_return_is_up_without_sign() {
        let k = Kpis::compute(&[bar(1, 50.0, 1.0), bar(2, 50.0, 1.0)]).unwrap();
        assert_eq!(k.return_label, "0.00%");
        assert_eq!(k.trend, "up");
    }

    #[test]
    fn zero_start_price_yields_zero_return() {
        let k = Kpis::compute(&[bar(1, 0.0, 1.0), bar(2, 5.0, 1.0)]).unwrap();
        assert!(k.total_return_pct.abs() < f64::EPSILON);
    }
}
