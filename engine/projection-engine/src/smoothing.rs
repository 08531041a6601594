//! Temporal smoothing and trend detection
//!
//! Adaptive EWMA over the recent window blended with the season average,
//! plus a time-decayed trend factor built from successive game-to-game
//! differences.

use chrono::{DateTime, Utc};

use crate::config::{SmoothingConfig, TrendConfig};
use crate::models::{Observation, Position};
use crate::stats;

/// Plain exponentially-weighted moving average, chronological input.
pub fn ewma(values: &[f64], alpha: f64) -> f64 {
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return 0.0;
    };
    iter.fold(first, |smoothed, &v| alpha * v + (1.0 - alpha) * smoothed)
}

/// Effective smoothing weight for a player.
///
/// Starts from the position's base alpha, reduced for volatile players
/// (up to half) and raised for longer histories, then clamped to the
/// configured bounds. Volatility and length come from the full season
/// sample even though smoothing itself runs on the recent window.
pub fn adaptive_alpha(position: Position, season_values: &[f64], config: &SmoothingConfig) -> f64 {
    let base = config
        .base_alpha
        .get(&position)
        .copied()
        .unwrap_or(config.default_alpha);
    let cv = stats::coefficient_of_variation(season_values);
    let volatility_scale = 1.0 - (cv / 2.0).min(0.5);
    let length_scale = if season_values.is_empty() {
        1.0
    } else {
        1.0 + (season_values.len() as f64).ln() / 10.0
    };
    (base * volatility_scale * length_scale).clamp(config.min_alpha, config.max_alpha)
}

/// Season/recent blended projection: fixed weight on the season average
/// plus the complementary weight on the adaptively smoothed recent form.
pub fn blended_projection(
    season_avg: f64,
    recent_values: &[f64],
    alpha: f64,
    config: &SmoothingConfig,
) -> f64 {
    if recent_values.is_empty() {
        return season_avg;
    }
    let smoothed = ewma(recent_values, alpha);
    config.season_weight * season_avg + config.recent_weight * smoothed
}

fn days_ago(
    obs: &Observation,
    current_period: u32,
    reference_time: Option<DateTime<Utc>>,
    config: &TrendConfig,
) -> f64 {
    match (obs.timestamp, reference_time) {
        (Some(ts), Some(now)) => {
            let days = (now - ts).num_seconds() as f64 / 86_400.0;
            days.max(0.0)
        }
        _ => {
            let periods = current_period.saturating_sub(obs.period_index) as f64;
            periods * config.days_per_period
        }
    }
}

/// Multiplicative trend factor from recency-weighted successive
/// differences, normalized by season volatility.
///
/// Returns 1.0 (neutral) when the window is too short or the season has
/// no variance to normalize against.
pub fn trend_factor(
    recent: &[Observation],
    season_std: f64,
    current_period: u32,
    reference_time: Option<DateTime<Utc>>,
    config: &TrendConfig,
) -> f64 {
    let observed: Vec<&Observation> = recent.iter().filter(|o| o.value.is_some()).collect();
    if observed.len() < config.min_games || season_std <= 0.0 {
        return 1.0;
    }

    let lambda = std::f64::consts::LN_2 / config.half_life_days;
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for pair in observed.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let diff = next.value.unwrap_or(0.0) - prev.value.unwrap_or(0.0);
        let age = days_ago(next, current_period, reference_time, config);
        let weight = (-lambda * age).exp();
        weighted_sum += diff * weight;
        weight_sum += weight;
    }
    if weight_sum <= 0.0 {
        return 1.0;
    }

    let slope = weighted_sum / weight_sum;
    let normalized = slope / season_std;
    let effect = (normalized * config.sensitivity)
        .clamp(-config.max_adjustment, config.max_adjustment);
    1.0 + effect
}
