//! Empirical-Bayes shrinkage toward position baselines
//!
//! Short histories carry little information; their estimates are pulled
//! toward the position mean with a weight driven by the ratio of
//! between-player variance to the player's own sampling variance.

use tracing::trace;

use crate::models::PositionBaseline;
use crate::stats;

/// Build a position baseline from qualifying peers' game samples.
/// Returns `None` with fewer than two peers (no between-player variance
/// to estimate).
pub fn position_baseline(peer_samples: &[Vec<f64>]) -> Option<PositionBaseline> {
    let qualifying: Vec<&Vec<f64>> = peer_samples.iter().filter(|s| !s.is_empty()).collect();
    if qualifying.len() < 2 {
        return None;
    }

    let pooled: Vec<f64> = qualifying.iter().flat_map(|s| s.iter().copied()).collect();
    let player_means: Vec<f64> = qualifying.iter().map(|s| stats::mean(s)).collect();
    let within: Vec<f64> = qualifying.iter().map(|s| stats::sample_variance(s)).collect();

    Some(PositionBaseline {
        mean: stats::mean(&pooled),
        between_variance: stats::population_variance(&player_means),
        within_variance: stats::mean(&within),
        players: qualifying.len(),
    })
}

/// Shrink a player estimate toward the position baseline.
///
/// The weight kept on the player's own estimate is
/// `between / (between + within / n)`: large samples and highly
/// differentiated positions keep the player estimate nearly intact,
/// while short noisy samples are pulled toward the position mean.
/// Returns the shrunken value and the weight kept on the player.
pub fn shrink_toward_baseline(
    player_estimate: f64,
    sample_size: usize,
    baseline: &PositionBaseline,
) -> (f64, f64) {
    if sample_size == 0 {
        return (baseline.mean, 0.0);
    }
    let sampling_variance = baseline.within_variance / sample_size as f64;
    let denominator = baseline.between_variance + sampling_variance;
    let weight = if denominator > 0.0 {
        baseline.between_variance / denominator
    } else {
        1.0
    };
    let shrunken = weight * player_estimate + (1.0 - weight) * baseline.mean;
    trace!(player_estimate, shrunken, weight, sample_size, "shrinkage applied");
    (shrunken, weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> PositionBaseline {
        PositionBaseline {
            mean: 60.0,
            between_variance: 400.0,
            within_variance: 900.0,
            players: 24,
        }
    }

    #[test]
    fn baseline_requires_two_peers() {
        assert!(position_baseline(&[]).is_none());
        assert!(position_baseline(&[vec![50.0, 60.0]]).is_none());
        let b = position_baseline(&[vec![50.0, 60.0], vec![80.0, 90.0]]).unwrap();
        assert_eq!(b.players, 2);
        assert!((b.mean - 70.0).abs() < 1e-9);
        assert!(b.between_variance > 0.0);
    }

    #[test]
    fn larger_samples_keep_more_player_weight() {
        let b = baseline();
        let (_, w_small) = shrink_toward_baseline(100.0, 2, &b);
        let (_, w_large) = shrink_toward_baseline(100.0, 12, &b);
        assert!(w_large > w_small);
        assert!(w_small > 0.0 && w_large < 1.0);
    }

    #[test]
    fn shrunken_value_lies_between_player_and_baseline() {
        let b = baseline();
        let (shrunken, weight) = shrink_toward_baseline(100.0, 5, &b);
        assert!(shrunken > b.mean && shrunken < 100.0);
        let expected = weight * 100.0 + (1.0 - weight) * b.mean;
        assert!((shrunken - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_keeps_player_estimate() {
        let b = PositionBaseline {
            mean: 60.0,
            between_variance: 0.0,
            within_variance: 0.0,
            players: 10,
        };
        let (shrunken, weight) = shrink_toward_baseline(100.0, 5, &b);
        assert_eq!(weight, 1.0);
        assert_eq!(shrunken, 100.0);
    }

    #[test]
    fn empty_sample_collapses_to_baseline_mean() {
        let (shrunken, weight) = shrink_toward_baseline(100.0, 0, &baseline());
        assert_eq!(shrunken, 60.0);
        assert_eq!(weight, 0.0);
    }
}
