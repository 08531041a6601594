//! Shared numeric helpers
//!
//! Small, allocation-light primitives used by every statistical module:
//! means, variances, interpolated percentiles, and the IQR outlier filter
//! applied to season samples before estimation.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n). Returns 0.0 for fewer than 2 values.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Sample variance (divides by n-1). Returns 0.0 for fewer than 2 values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Coefficient of variation (std/mean), 0.0 when the mean is non-positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    population_std(values) / m
}

/// Median of a slice (does not require pre-sorting).
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Extract a quantile from an ascending-sorted slice, interpolating
/// linearly between order statistics for non-integer ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if q <= 0.0 {
        return sorted[0];
    }
    if q >= 1.0 {
        return sorted[sorted.len() - 1];
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = position - lower as f64;
    sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
}

/// Round to one decimal place (output precision for projection values).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to two decimal places (modifier/diagnostic precision).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// IQR outlier filter for season samples.
///
/// Fences at Q1 - mult*IQR and Q3 + mult*IQR, computed on the input
/// itself. Requires at least `min_sample` values. If more than
/// `max_removed_share` of the sample would be dropped the player is
/// treated as legitimately high-variance and the sample is kept whole.
pub fn filter_outliers(
    values: &[f64],
    min_sample: usize,
    mult: f64,
    max_removed_share: f64,
) -> Vec<f64> {
    if values.len() < min_sample {
        return values.to_vec();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = sorted[(sorted.len() as f64 * 0.25).floor() as usize];
    let q3 = sorted[(sorted.len() as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;
    let lower = q1 - mult * iqr;
    let upper = q3 + mult * iqr;

    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v >= lower && *v <= upper)
        .collect();

    let removed = values.len() - kept.len();
    if removed as f64 / values.len() as f64 > max_removed_share {
        return values.to_vec();
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_variance_basics() {
        let values = [150.0, 200.0, 180.0, 220.0, 160.0];
        assert!((mean(&values) - 182.0).abs() < 1e-9);
        assert!((population_variance(&values) - 656.0).abs() < 1e-9);
        assert!(sample_variance(&values) > population_variance(&values));
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert!((percentile(&sorted, 0.5) - 25.0).abs() < 1e-9);
        assert!((percentile(&sorted, 0.0) - 10.0).abs() < 1e-9);
        assert!((percentile(&sorted, 1.0) - 40.0).abs() < 1e-9);
        // position 0.25 * 3 = 0.75 -> between 10 and 20
        assert!((percentile(&sorted, 0.25) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn outlier_filter_removes_extremes() {
        let values = [50.0, 55.0, 48.0, 52.0, 51.0, 49.0, 53.0, 300.0];
        let kept = filter_outliers(&values, 4, 1.5, 0.30);
        assert_eq!(kept.len(), 7);
        assert!(!kept.contains(&300.0));
    }

    #[test]
    fn outlier_filter_keeps_high_variance_samples() {
        // Half the sample would be fenced out: keep everything.
        let values = [10.0, 12.0, 11.0, 200.0, 210.0, 205.0];
        let kept = filter_outliers(&values, 4, 0.1, 0.30);
        assert_eq!(kept.len(), values.len());
    }

    #[test]
    fn outlier_filter_skips_small_samples() {
        let values = [10.0, 400.0, 12.0];
        assert_eq!(filter_outliers(&values, 4, 1.5, 0.30).len(), 3);
    }
}
