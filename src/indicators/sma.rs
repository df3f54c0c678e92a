// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Sliding-window arithmetic mean. A running sum is kept together with a queue
// of the values currently inside the window so every step is O(1):
//
//   push v          => sum += v
//   queue > window  => sum -= oldest
//   queue == window => SMA_t = sum / window
//
// Indices before the window fills have no value.
// =============================================================================

use std::collections::VecDeque;

/// Compute the moving average of `values` over `window`, aligned to the input.
///
/// The output has exactly `values.len()` entries; entry `i` is `None` while
/// fewer than `window` values have been seen.
///
/// # Edge cases
/// - `window == 0` => all `None`
/// - `values.len() < window` => all `None`
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let mut sum = 0.0_f64;
    let capacity = window.min(values.len()).saturating_add(1);
    let mut queue: VecDeque<f64> = VecDeque::with_capacity(capacity);

    for (i, &v) in values.iter().enumerate() {
        queue.push_back(v);
        sum += v;
        if queue.len() > window {
            if let Some(old) = queue.pop_front() {
                sum -= old;
            }
        }
        if queue.len() == window {
            out[i] = Some(sum / window as f64);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_window_zero_is_all_none() {
        let out = moving_average(&[1.0, 2.0, 3.0], 0);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn sma_insufficient_data() {
        let out = moving_average(&[1.0, 2.0], 5);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn sma_known_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_average(&values, 3);
        assert_eq!(out.len(), 5);
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert!((out[2].unwrap() - 2.0).abs() < 1e-10);
        assert!((out[3].unwrap() - 3.0).abs() < 1e-10);
        assert!((out[4].unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn sma_window_one_is_identity() {
        let values = [3.5, 7.25, 1.0];
        let out = moving_average(&values, 1);
        for (a, b) in out.iter().zip(values.iter()) {
            assert!((a.unwrap() - b).abs() < 1e-12);
        }
    }

    #[test]
    fn sma_matches_naive_mean_on_long_series() {
        let values: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        let out = moving_average(&values, 50);
        for i in 49..values.len() {
            let naive = values[i + 1 - 50..=i].iter().sum::<f64>() / 50.0;
            assert!((out[i].unwrap() - naive).abs() < 1e-9, "index {i}");
        }
    }

    #[test]
    fn sma_huge_window_is_all_none() {
        let out = moving_average(&[1.0, 2.0, 3.0], usize::MAX);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Option::is_none));
    }
}
