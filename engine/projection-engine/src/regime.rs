//! CUSUM regime-change detection
//!
//! Flags sustained upward level shifts in a player's production (role
//! change, new scheme, return from injury) so the smoothing layer can
//! lean on post-change games instead of the full-season mixture.

use tracing::debug;

use crate::config::RegimeConfig;
use crate::stats;

/// Outcome of regime detection over a season sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeDetection {
    /// Index of the first observation in the new regime.
    pub changepoint: usize,
}

/// CUSUM over standardized deviations from the series' own mean:
/// `S_t = max(0, S_{t-1} + (x_t - mean)/std - slack)`.
///
/// When the accumulator crosses the threshold, the changepoint reported
/// is where the current drift started (the last index at which the
/// accumulator restarted from zero), not where it peaked. Returns `None`
/// for short, flat, or stable series.
pub fn detect(values: &[f64], config: &RegimeConfig) -> Option<RegimeDetection> {
    if values.len() < config.min_observations {
        return None;
    }
    let mean = stats::mean(values);
    let std = stats::population_std(values);
    if std <= 0.0 {
        return None;
    }

    let mut cumulative = 0.0f64;
    let mut drift_start = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if cumulative == 0.0 {
            drift_start = i;
        }
        let deviation = (v - mean) / std - config.slack;
        cumulative = (cumulative + deviation).max(0.0);
        if cumulative > config.threshold {
            debug!(changepoint = drift_start, crossed_at = i, "regime change detected");
            return Some(RegimeDetection { changepoint: drift_start });
        }
    }
    None
}

/// Mean and standard deviation after blending post-change observations
/// with the full season. Applies only when enough post-change games
/// exist; otherwise the season stats are returned unchanged.
pub fn reweighted_stats(
    values: &[f64],
    detection: Option<RegimeDetection>,
    config: &RegimeConfig,
) -> (f64, f64) {
    let season_mean = stats::mean(values);
    let season_std = stats::population_std(values);
    let Some(d) = detection else {
        return (season_mean, season_std);
    };
    let post = &values[d.changepoint..];
    if post.len() < config.min_post_change {
        return (season_mean, season_std);
    }
    let w = config.post_change_weight;
    let mean = w * stats::mean(post) + (1.0 - w) * season_mean;
    let std = w * stats::population_std(post) + (1.0 - w) * season_std;
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensitive() -> RegimeConfig {
        RegimeConfig { threshold: 2.0, ..RegimeConfig::default() }
    }

    #[test]
    fn stable_series_has_no_regime_change() {
        let stable = [62.0, 58.0, 65.0, 60.0, 59.0, 63.0, 61.0, 57.0];
        assert!(detect(&stable, &sensitive()).is_none());
    }

    #[test]
    fn short_or_flat_series_is_skipped() {
        let config = RegimeConfig::default();
        assert!(detect(&[10.0, 90.0, 15.0], &config).is_none());
        assert!(detect(&[50.0; 8], &config).is_none());
    }

    #[test]
    fn step_change_reports_shift_start() {
        let shifted = [45.0, 47.0, 44.0, 46.0, 43.0, 95.0, 98.0, 93.0, 96.0, 94.0];
        let detection = detect(&shifted, &sensitive()).expect("shift should trip the detector");
        assert_eq!(detection.changepoint, 5);
    }

    #[test]
    fn reweighting_pulls_mean_toward_post_change_level() {
        let config = sensitive();
        let values = [45.0, 47.0, 44.0, 46.0, 43.0, 95.0, 98.0, 93.0, 96.0, 94.0];
        let detection = detect(&values, &config);
        let (mean, std) = reweighted_stats(&values, detection, &config);
        let season_mean = stats::mean(&values);
        assert!(mean > season_mean + 10.0);
        assert!(std < stats::population_std(&values));
    }

    #[test]
    fn reweighting_requires_enough_post_change_games() {
        let config = RegimeConfig::default();
        let values = [30.0, 35.0, 28.0, 32.0, 31.0, 95.0];
        let detection = Some(RegimeDetection { changepoint: 5 });
        let (mean, std) = reweighted_stats(&values, detection, &config);
        assert!((mean - stats::mean(&values)).abs() < 1e-12);
        assert!((std - stats::population_std(&values)).abs() < 1e-12);
    }
}
