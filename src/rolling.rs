//! Rolling-window statistics over series with missing samples.
//!
//! Missing samples (`None`) never contribute to a statistic. A window that
//! holds fewer than `min_periods` valid samples yields `None`.

/// Rolling median over a window centered on each index.
///
/// For an even `window` the extra sample is taken from before the center, so
/// a window of 50 covers `i-25..=i+24` and a window of 5 covers `i-2..=i+2`.
pub fn rolling_median_centered(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 {
        return vec![None; n];
    }
    let before = window / 2;
    let after = (window - 1) / 2;
    let mut scratch: Vec<f64> = Vec::with_capacity(window);

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after + 1).min(n);

            scratch.clear();
            scratch.extend(values[lo..hi].iter().flatten().copied());

            if scratch.is_empty() || scratch.len() < min_periods {
                return None;
            }
            Some(median_in_place(&mut scratch))
        })
        .collect()
}

/// Rolling sum over the trailing window `i+1-window..=i`.
pub fn rolling_sum_trailing(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let mut sums = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value {
            sum += v;
            count += 1;
        }
        if window > 0 && i >= window {
            if let Some(old) = values[i - window] {
                sum -= old;
                count -= 1;
            }
        }

        if window > 0 && count > 0 && count >= min_periods {
            sums.push(Some(sum));
        } else {
            sums.push(None);
        }
    }

    sums
}

/// Median of a non-empty slice. Reorders the slice.
fn median_in_place(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median_in_place(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_in_place(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_centered_median_window_bounds() {
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let medians = rolling_median_centered(&values, 5, 1);

        // Edges shrink the window instead of padding it
        assert_eq!(medians[0], Some(1.0)); // 0, 1, 2
        assert_eq!(medians[1], Some(1.5)); // 0..=3
        assert_eq!(medians[5], Some(5.0)); // 3..=7
        assert_eq!(medians[9], Some(8.0)); // 7, 8, 9
    }

    #[test]
    fn test_centered_median_ignores_missing() {
        let values = vec![Some(1.0), None, Some(100.0), None, Some(1.0)];
        let medians = rolling_median_centered(&values, 5, 1);
        assert_eq!(medians[2], Some(1.0));
    }

    #[test]
    fn test_centered_median_min_periods() {
        let values = vec![Some(1.0), None, None, None, None, None, Some(2.0)];
        let medians = rolling_median_centered(&values, 5, 2);
        assert!(medians.iter().all(|m| m.is_none()));
    }

    #[test]
    fn test_trailing_sum() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let sums = rolling_sum_trailing(&values, 2, 1);
        assert_eq!(sums, vec![Some(1.0), Some(3.0), Some(5.0), Some(7.0)]);
    }

    #[test]
    fn test_trailing_sum_skips_missing_and_respects_min_periods() {
        let values = vec![Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), Some(1.0)];
        let sums = rolling_sum_trailing(&values, 3, 3);
        // Only the last window is fully populated
        assert_eq!(sums, vec![None, None, None, None, None, Some(3.0)]);
    }
}
