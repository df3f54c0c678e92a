// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ). σ is the population standard deviation of the
// window. The Band Width (BBW) is the normalised distance:
// BBW = (upper - lower) / middle * 100.

use serde::Serialize;

/// Bands for the most recent window.
#[derive(Debug, Clone, Serialize)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub width: f64,
}

/// Bands aligned to the input closes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands for the last `period` closes.
///
/// Returns `None` when:
/// - `period` is zero or there are fewer than `period` closes.
/// - Middle band is zero (width undefined).
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerResult> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let (middle, std_dev) = mean_std(&closes[closes.len() - period..]);
    if middle == 0.0 {
        return None;
    }

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;
    let width = (upper - lower) / middle * 100.0;

    width.is_finite().then_some(BollingerResult {
        upper,
        middle,
        lower,
        width,
    })
}

/// Rolling Bollinger Bands; entries before index `period - 1` are `None`.
pub fn bollinger_bands(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let len = closes.len();
    let mut series = BollingerSeries {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if period == 0 || len < period {
        return series;
    }

    for (offset, window) in closes.windows(period).enumerate() {
        let i = offset + period - 1;
        let (mean, std_dev) = mean_std(window);
        if !mean.is_finite() || !std_dev.is_finite() {
            continue;
        }
        series.middle[i] = Some(mean);
        series.upper[i] = Some(mean + num_std * std_dev);
        series.lower[i] = Some(mean - num_std * std_dev);
    }

    series
}

fn mean_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!(bb.upper > bb.middle);
        assert!(bb.lower < bb.middle);
        assert!((bb.middle - 10.5).abs() < 1e-10);
        assert!(bb.width > 0.0);
    }

    #[test]
    fn bollinger_insufficient_data() {
        assert!(calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0).is_none());
    }

    #[test]
    fn bollinger_flat() {
        let bb = calculate_bollinger(&vec![100.0; 20], 20, 2.0).unwrap();
        assert!(bb.width.abs() < 1e-10);
    }

    #[test]
    fn bands_known_population_std() {
        // mean 5, population σ 2
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let series = bollinger_bands(&closes, 8, 2.0);
        assert!(series.middle[..7].iter().all(Option::is_none));
        assert!((series.middle[7].unwrap() - 5.0).abs() < 1e-10);
        assert!((series.upper[7].unwrap() - 9.0).abs() < 1e-10);
        assert!((series.lower[7].unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn bands_last_matches_point_calculation() {
        let closes: Vec<f64> = (0..50).map(|i| 20.0 + (i as f64 * 0.3).cos()).collect();
        let series = bollinger_bands(&closes, 20, 2.0);
        let point = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!((series.upper[49].unwrap() - point.upper).abs() < 1e-10);
        assert!((series.lower[49].unwrap() - point.lower).abs() < 1e-10);
    }

    #[test]
    fn bands_zero_period_all_none() {
        let series = bollinger_bands(&[1.0, 2.0], 0, 2.0);
        assert_eq!(series.middle, vec![None, None]);
    }
}
