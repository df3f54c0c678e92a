// =============================================================================
// Synthetic fallback series
// =============================================================================
//
// When no remote or exported data is available the dashboard still needs
// something to draw. The generator walks one calendar year of weekdays with a
// multiplicative random shock:
//
//   shock ~ U[-0.025, 0.025)
//   p     = max(1, p * (1 + shock))        starting at p = 100
//
// and derives the remaining OHLCV fields from the close.
// =============================================================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;

use crate::types::Bar;

/// Default number of calendar days covered by the fallback series.
pub const DEFAULT_DAYS: u32 = 365;

const START_PRICE: f64 = 100.0;
const MAX_SHOCK: f64 = 0.025;
const BASE_VOLUME: f64 = 1_000_000.0;
const VOLUME_JITTER: f64 = 500_000.0;

/// Generate a weekday-only random walk covering `days` calendar days that
/// start `days` before `end`.
pub fn generate<R: Rng>(end: NaiveDate, days: u32, rng: &mut R) -> Vec<Bar> {
    let start = end - Duration::days(i64::from(days));
    let mut bars = Vec::with_capacity(days as usize);
    let mut p = START_PRICE;

    for i in 0..days {
        let date = start + Duration::days(i64::from(i));
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let shock: f64 = rng.gen_range(-MAX_SHOCK..MAX_SHOCK);
        p = (p * (1.0 + shock)).max(1.0);

        bars.push(Bar {
            date,
            open: p * 0.99,
            high: p * 1.01,
            low: p * 0.98,
            close: p,
            volume: BASE_VOLUME + rng.gen_range(0.0..VOLUME_JITTER),
        });
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn skips_weekends() {
        let mut rng = StdRng::seed_from_u64(7);
        let bars = generate(end(), DEFAULT_DAYS, &mut rng);
        assert!(!bars.is_empty());
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        // 365 calendar days hold 260 or 261 weekdays.
        assert!((260..=261).contains(&bars.len()), "got {}", bars.len());
    }

    #[test]
    fn dates_are_strictly_increasing() {
        let mut rng = StdRng::seed_from_u64(1);
        let bars = generate(end(), 60, &mut rng);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        assert!(bars.last().unwrap().date < end());
    }

    #[test]
    fn bar_shape_and_floor() {
        let mut rng = StdRng::seed_from_u64(42);
        for b in generate(end(), DEFAULT_DAYS, &mut rng) {
            assert!(b.close >= 1.0);
            assert!((b.open - b.close * 0.99).abs() < 1e-9);
            assert!((b.high - b.close * 1.01).abs() < 1e-9);
            assert!((b.low - b.close * 0.98).abs() < 1e-9);
            assert!((BASE_VOLUME..BASE_VOLUME + VOLUME_JITTER).contains(&b.volume));
        }
    }

    #[test]
    fn daily_moves_are_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let bars = generate(end(), DEFAULT_DAYS, &mut rng);
        for w in bars.windows(2) {
            let ratio = w[1].close / w[0].close;
            // The floor at 1.0 can only lift the ratio above the shock band.
            assert!(ratio >= 1.0 - MAX_SHOCK - 1e-12, "ratio {ratio}");
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate(end(), 30, &mut StdRng::seed_from_u64(9));
        let b = generate(end(), 30, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_days_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate(end(), 0, &mut rng).is_empty());
    }
}
