//! Projection orchestrator
//!
//! Composes the statistical modules into one per-stat projection:
//! outlier filtering, regime detection, smoothing/trend, shrinkage, the
//! modifier product, the resampling estimator, and the minimum-floor and
//! participation postprocessing.

use rand::Rng;
use tracing::{debug, info};

use crate::bootstrap;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    ModifierSet, ProjectionDiagnostics, ProjectionRequest, ProjectionResult,
};
use crate::modifiers;
use crate::regime;
use crate::shrinkage;
use crate::smoothing;
use crate::stats;

/// Stateless projection engine. Holds validated configuration only; all
/// player and league data arrives with each request.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    config: EngineConfig,
}

impl ProjectionEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Project one (player, stat) pair. Returns `None` when the player
    /// has not recorded enough games to project from.
    pub fn project<R: Rng>(
        &self,
        request: &ProjectionRequest,
        rng: &mut R,
    ) -> Option<ProjectionResult> {
        let season_values = request.series.values();
        if season_values.len() < self.config.min_games_played {
            debug!(
                stat = %request.stat,
                games = season_values.len(),
                required = self.config.min_games_played,
                "insufficient history, skipping projection"
            );
            return None;
        }

        let sample = stats::filter_outliers(
            &season_values,
            self.config.outliers.min_sample,
            self.config.outliers.iqr_multiplier,
            self.config.outliers.max_removed_share,
        );

        // Regime-aware season stats drive smoothing and trend; the
        // estimator still resamples the full filtered sample so the
        // interval reflects observed game-to-game spread.
        let detection = regime::detect(&sample, &self.config.regime);
        let (season_mean, season_std) =
            regime::reweighted_stats(&sample, detection, &self.config.regime);

        let window = self.config.window_for(request.position);
        let recent = request.series.recent(window);
        let recent_values = request.series.recent_values(window);

        let alpha = smoothing::adaptive_alpha(request.position, &sample, &self.config.smoothing);
        let blended =
            smoothing::blended_projection(season_mean, &recent_values, alpha, &self.config.smoothing);

        let (shrunken, shrinkage_weight) = match &request.baseline {
            Some(baseline) => {
                shrinkage::shrink_toward_baseline(blended, sample.len(), baseline)
            }
            None => (blended, 1.0),
        };

        let trend = smoothing::trend_factor(
            recent,
            season_std,
            request.current_period,
            request.reference_time,
            &self.config.trend,
        );

        let mut modifier_set = ModifierSet {
            opponent_factor: modifiers::opponent_factor(
                request.opponent.as_ref(),
                &self.config.opponent,
            ),
            environment_factor: modifiers::environment_factor(
                request.environment.as_ref(),
                &self.config.environment,
            ),
            efficiency_factor: modifiers::efficiency_factor(
                request.efficiency.as_ref(),
                &self.config.efficiency,
            ),
            volume_factor: 1.0,
            participation_probability: 1.0,
        };
        if request.volume_sensitive {
            modifier_set.volume_factor =
                modifiers::volume_factor(request.market.as_ref(), &self.config.game_script);
        }
        let participation =
            modifiers::participation_profile(request.injury.as_ref(), &self.config.participation);
        modifier_set.participation_probability = participation.probability;

        // Model-side expected value, kept as a diagnostic alongside the
        // estimator's median.
        let model_expected = stats::round1(
            shrunken
                * trend
                * modifier_set.opponent_factor
                * modifier_set.efficiency_factor
                * modifier_set.volume_factor,
        );

        let combined = modifier_set.combined();
        let interval =
            bootstrap::modified_interval(&sample, combined, &self.config.bootstrap, rng);

        let mut floor = interval.floor;
        let mut expected = interval.expected;
        let mut ceiling = interval.ceiling;

        // Projections never dip below the positional minimum for the
        // stat; raise the rest of the triple to keep ordering.
        let mut minimum_floor_applied = false;
        if let Some(min_floor) =
            self.config.minimum_floor_for(request.position, &request.stat)
        {
            if floor < min_floor {
                floor = min_floor;
                minimum_floor_applied = true;
                if expected < floor {
                    expected = floor;
                }
                if ceiling < expected {
                    ceiling = expected;
                }
            }
        }

        let mut confidence =
            bootstrap::assess_confidence(&interval, &self.config.confidence);

        let injury_adjusted = participation.probability < 1.0;
        if injury_adjusted {
            floor = stats::round1(floor * participation.probability);
            expected = stats::round1(expected * participation.probability);
            ceiling = stats::round1(ceiling * participation.probability);
            confidence = confidence.downgraded();
        }

        let result = ProjectionResult {
            stat: request.stat.clone(),
            floor,
            expected,
            ceiling,
            confidence_level: confidence,
            sample_size: interval.sample_size,
            interval_width: interval.interval_width,
            diagnostics: ProjectionDiagnostics {
                method: interval.method,
                modifiers: modifier_set,
                trend_factor: stats::round2(trend),
                season_avg: stats::round1(season_mean),
                recent_avg: stats::round1(stats::mean(&recent_values)),
                model_expected,
                ewma_alpha: stats::round2(alpha),
                regime_detected: detection.is_some(),
                regime_changepoint: detection.map(|d| d.changepoint),
                shrinkage_weight: stats::round2(shrinkage_weight),
                bootstrap_samples: interval.bootstrap_samples,
                injury_adjusted,
                minimum_floor_applied,
            },
        };

        info!(
            stat = %request.stat,
            position = request.position.as_str(),
            floor = result.floor,
            expected = result.expected,
            ceiling = result.ceiling,
            confidence = ?result.confidence_level,
            "projection computed"
        );
        Some(result)
    }
}
