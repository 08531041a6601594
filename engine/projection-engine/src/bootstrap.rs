//! Modified block-bootstrap prediction intervals
//!
//! Resamples a player's game log to estimate floor/expected/ceiling under
//! a scalar modifier. Short samples fall back to per-point resampling;
//! longer samples use contiguous blocks so week-to-week autocorrelation
//! survives the resampling.

use rand::Rng;
use tracing::debug;

use crate::config::{BootstrapConfig, ConfidenceThresholds, Statistic};
use crate::models::{ConfidenceLevel, EstimatorMethod, PredictionInterval};
use crate::stats;

/// Minimum sample size for block resampling.
const BLOCK_MIN_SAMPLE: usize = 5;
/// Sample size at which blocks grow from 2 to 3.
const LONG_SAMPLE: usize = 10;

fn block_size(n: usize) -> usize {
    if n >= LONG_SAMPLE {
        3
    } else {
        2
    }
}

fn replicate_statistic(values: &[f64], statistic: Statistic) -> f64 {
    match statistic {
        Statistic::Mean => stats::mean(values),
        Statistic::Median => stats::median(values),
    }
}

/// Compute a modified prediction interval for `sample` under `modifier`.
///
/// Every observation in each replicate is scaled by the modifier before
/// the replicate statistic is taken, so the interval width scales with
/// the modifier rather than just shifting. Replicates match the original
/// sample length (block resampling truncates the final partial block).
pub fn modified_interval<R: Rng>(
    sample: &[f64],
    modifier: f64,
    config: &BootstrapConfig,
    rng: &mut R,
) -> PredictionInterval {
    let n = sample.len();
    if n == 0 {
        return PredictionInterval::empty(modifier, config.num_samples);
    }
    if n == 1 {
        let v = stats::round1(sample[0] * modifier);
        return PredictionInterval {
            floor: v,
            expected: v,
            ceiling: v,
            sample_size: 1,
            bootstrap_samples: config.num_samples,
            interval_width: 0.0,
            coefficient_of_variation: 0.0,
            method: EstimatorMethod::Percentile,
            modifier,
        };
    }

    let method = if n >= BLOCK_MIN_SAMPLE {
        EstimatorMethod::PercentileBlock
    } else {
        EstimatorMethod::Percentile
    };
    let block = block_size(n);

    let mut replicates = Vec::with_capacity(config.num_samples);
    let mut resampled = Vec::with_capacity(n);
    for _ in 0..config.num_samples {
        resampled.clear();
        match method {
            EstimatorMethod::Percentile => {
                for _ in 0..n {
                    let v = sample[rng.gen_range(0..n)];
                    resampled.push(v * modifier);
                }
            }
            EstimatorMethod::PercentileBlock => {
                // Circular blocks: starts cover every index and wrap
                // around the end of the sample, so each observation is
                // equally represented in the replicates.
                while resampled.len() < n {
                    let start = rng.gen_range(0..n);
                    for offset in 0..block {
                        if resampled.len() == n {
                            break;
                        }
                        resampled.push(sample[(start + offset) % n] * modifier);
                    }
                }
            }
        }
        replicates.push(replicate_statistic(&resampled, config.statistic));
    }

    replicates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let tail = (1.0 - config.confidence) / 2.0;
    let floor = stats::round1(stats::percentile(&replicates, tail));
    let expected = stats::round1(stats::percentile(&replicates, 0.5));
    let ceiling = stats::round1(stats::percentile(&replicates, 1.0 - tail));

    let interval_width = stats::round1(ceiling - floor);
    let cv = if expected > 0.0 {
        stats::round2(interval_width / expected)
    } else {
        0.0
    };

    debug!(
        sample_size = n,
        method = method.as_str(),
        modifier,
        floor,
        expected,
        ceiling,
        "bootstrap interval computed"
    );

    PredictionInterval {
        floor,
        expected,
        ceiling,
        sample_size: n,
        bootstrap_samples: config.num_samples,
        interval_width,
        coefficient_of_variation: cv,
        method,
        modifier,
    }
}

/// Classify projection confidence from sample size and relative interval
/// width.
pub fn assess_confidence(
    interval: &PredictionInterval,
    thresholds: &ConfidenceThresholds,
) -> ConfidenceLevel {
    let n = interval.sample_size;
    let cv = interval.coefficient_of_variation;
    if n >= thresholds.high_min_games && cv <= thresholds.high_max_cv {
        ConfidenceLevel::High
    } else if n >= thresholds.medium_min_games && cv <= thresholds.medium_max_cv {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}
