//! Engine configuration
//!
//! Nested per-concern sections with defaults matching the production
//! tuning. Supports TOML files plus `PROJ_*` environment overrides for
//! the handful of knobs operators actually change between runs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::models::Position;

/// Which statistic the resampling estimator computes per replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Median,
}

/// Resampling estimator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of bootstrap replicates per projection.
    pub num_samples: usize,
    /// Central interval mass (0.80 keeps the 10th-90th percentiles).
    pub confidence: f64,
    /// Per-replicate statistic.
    pub statistic: Statistic,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { num_samples: 500, confidence: 0.80, statistic: Statistic::Mean }
    }
}

/// Sample-size and dispersion cutoffs for confidence classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high_min_games: usize,
    pub medium_min_games: usize,
    pub high_max_cv: f64,
    pub medium_max_cv: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self { high_min_games: 8, medium_min_games: 5, high_max_cv: 0.30, medium_max_cv: 0.50 }
    }
}

/// Adaptive EWMA settings. Base alphas are per-position; the effective
/// alpha also responds to sample volatility and length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub default_alpha: f64,
    pub min_alpha: f64,
    pub max_alpha: f64,
    /// Weight on the season average in the blended projection.
    pub season_weight: f64,
    /// Weight on the smoothed recent form.
    pub recent_weight: f64,
    pub base_alpha: HashMap<Position, f64>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        let mut base_alpha = HashMap::new();
        base_alpha.insert(Position::Qb, 0.25);
        base_alpha.insert(Position::Rb, 0.35);
        base_alpha.insert(Position::Wr, 0.40);
        base_alpha.insert(Position::Te, 0.30);
        Self {
            default_alpha: 0.30,
            min_alpha: 0.15,
            max_alpha: 0.65,
            season_weight: 0.4,
            recent_weight: 0.6,
            base_alpha,
        }
    }
}

/// Time-decayed trend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Observations required before a trend is computed.
    pub min_games: usize,
    /// Fraction of the normalized slope applied as an adjustment.
    pub sensitivity: f64,
    /// Symmetric clamp on the trend effect.
    pub max_adjustment: f64,
    /// Half-life in days for recency weighting of differences.
    pub half_life_days: f64,
    /// Days assumed per period when timestamps are missing.
    pub days_per_period: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_games: 3,
            sensitivity: 0.5,
            max_adjustment: 0.30,
            half_life_days: 10.0,
            days_per_period: 7.0,
        }
    }
}

/// CUSUM regime-change detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Slack parameter (in standard deviations) absorbed per step.
    pub slack: f64,
    /// Cumulative-sum threshold that signals a change.
    pub threshold: f64,
    /// Observations required before detection is attempted.
    pub min_observations: usize,
    /// Weight on post-change observations when reweighting stats.
    pub post_change_weight: f64,
    /// Post-change observations required before reweighting applies.
    pub min_post_change: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            slack: 0.5,
            threshold: 4.0,
            min_observations: 4,
            post_change_weight: 0.8,
            min_post_change: 2,
        }
    }
}

/// Opponent-difficulty modifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentFactorConfig {
    /// Opponent games below which the ratio is shrunk toward neutral.
    pub min_sample: usize,
    /// Neutral target the ratio is shrunk toward.
    pub target_mean: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for OpponentFactorConfig {
    fn default() -> Self {
        Self { min_sample: 4, target_mean: 1.0, min_factor: 0.7, max_factor: 1.3 }
    }
}

/// Environment modifier settings: per-condition sub-factors, weather
/// thresholds, and learned condition importances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub home_factor: f64,
    pub away_factor: f64,
    pub turf_factor: f64,
    pub grass_factor: f64,
    pub dome_factor: f64,
    pub outdoor_factor: f64,
    pub high_wind_factor: f64,
    pub cold_factor: f64,
    pub precipitation_factor: f64,
    /// Wind speed (mph) at or above which the wind penalty applies.
    pub wind_threshold_mph: f64,
    /// Temperature (F) at or below which the cold penalty applies.
    pub cold_threshold_f: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    /// Learned importance per condition key ("home", "surface", "roof",
    /// "weather"). 0.25 is neutral.
    pub learned_importance: HashMap<String, f64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        let mut learned_importance = HashMap::new();
        learned_importance.insert("home".to_string(), 0.25);
        learned_importance.insert("surface".to_string(), 0.25);
        learned_importance.insert("roof".to_string(), 0.25);
        learned_importance.insert("weather".to_string(), 0.25);
        Self {
            home_factor: 1.03,
            away_factor: 0.97,
            turf_factor: 1.02,
            grass_factor: 1.0,
            dome_factor: 1.02,
            outdoor_factor: 1.0,
            high_wind_factor: 0.95,
            cold_factor: 0.97,
            precipitation_factor: 0.95,
            wind_threshold_mph: 15.0,
            cold_threshold_f: 25.0,
            min_factor: 0.8,
            max_factor: 1.2,
            learned_importance,
        }
    }
}

/// Play-efficiency modifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyConfig {
    /// Multiplier applied per standard deviation of EPA.
    pub weight_per_sigma: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    /// League data points required for a non-neutral factor.
    pub min_league_samples: usize,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self { weight_per_sigma: 0.10, min_factor: 0.85, max_factor: 1.15, min_league_samples: 10 }
    }
}

/// Game-script volume modifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameScriptConfig {
    /// Implied team total above which volume is boosted.
    pub high_total: f64,
    /// Implied team total below which volume is reduced.
    pub low_total: f64,
    /// Magnitude of the boost/reduction.
    pub adjustment: f64,
}

impl Default for GameScriptConfig {
    fn default() -> Self {
        Self { high_total: 27.0, low_total: 20.0, adjustment: 0.10 }
    }
}

/// Injury-participation modifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipationConfig {
    pub out_probability: f64,
    pub doubtful_probability: f64,
    pub questionable_probability: f64,
    pub probable_probability: f64,
    /// Snap-share trend adjustments applied on top of the status
    /// probability for questionable players.
    pub rising_snaps_bonus: f64,
    pub falling_snaps_penalty: f64,
}

impl Default for ParticipationConfig {
    fn default() -> Self {
        Self {
            out_probability: 0.0,
            doubtful_probability: 0.25,
            questionable_probability: 0.70,
            probable_probability: 0.95,
            rising_snaps_bonus: 0.10,
            falling_snaps_penalty: 0.15,
        }
    }
}

/// IQR outlier-filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    pub iqr_multiplier: f64,
    pub min_sample: usize,
    /// Guard: keep the raw sample when the filter would remove more
    /// than this share of it.
    pub max_removed_share: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self { iqr_multiplier: 1.5, min_sample: 4, max_removed_share: 0.30 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Games required before any projection is produced.
    pub min_games_played: usize,
    /// Default recent-form window length.
    pub rolling_window: usize,
    /// Per-position overrides of the recent-form window.
    pub rolling_window_by_position: HashMap<Position, usize>,
    /// Minimum floor values keyed by position, then stat.
    pub minimum_floors: HashMap<Position, HashMap<String, f64>>,
    pub bootstrap: BootstrapConfig,
    pub confidence: ConfidenceThresholds,
    pub smoothing: SmoothingConfig,
    pub trend: TrendConfig,
    pub regime: RegimeConfig,
    pub opponent: OpponentFactorConfig,
    pub environment: EnvironmentConfig,
    pub efficiency: EfficiencyConfig,
    pub game_script: GameScriptConfig,
    pub participation: ParticipationConfig,
    pub outliers: OutlierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut rolling_window_by_position = HashMap::new();
        rolling_window_by_position.insert(Position::Qb, 5);
        rolling_window_by_position.insert(Position::Rb, 4);
        rolling_window_by_position.insert(Position::Wr, 5);
        rolling_window_by_position.insert(Position::Te, 5);
        let mut minimum_floors: HashMap<Position, HashMap<String, f64>> = HashMap::new();
        minimum_floors.insert(
            Position::Qb,
            HashMap::from([
                ("passing_yards".to_string(), 120.0),
                ("fantasy_points_ppr".to_string(), 2.0),
            ]),
        );
        minimum_floors.insert(
            Position::Rb,
            HashMap::from([
                ("rushing_yards".to_string(), 15.0),
                ("receiving_yards".to_string(), 5.0),
                ("fantasy_points_ppr".to_string(), 2.0),
            ]),
        );
        minimum_floors.insert(
            Position::Wr,
            HashMap::from([
                ("receiving_yards".to_string(), 10.0),
                ("fantasy_points_ppr".to_string(), 2.0),
            ]),
        );
        minimum_floors.insert(
            Position::Te,
            HashMap::from([
                ("receiving_yards".to_string(), 5.0),
                ("fantasy_points_ppr".to_string(), 1.0),
            ]),
        );
        Self {
            min_games_played: 3,
            rolling_window: 5,
            rolling_window_by_position,
            minimum_floors,
            bootstrap: BootstrapConfig::default(),
            confidence: ConfidenceThresholds::default(),
            smoothing: SmoothingConfig::default(),
            trend: TrendConfig::default(),
            regime: RegimeConfig::default(),
            opponent: OpponentFactorConfig::default(),
            environment: EnvironmentConfig::default(),
            efficiency: EfficiencyConfig::default(),
            game_script: GameScriptConfig::default(),
            participation: ParticipationConfig::default(),
            outliers: OutlierConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ProjectionError::config_load(format!("{}: {e}", path.display())))?;
        let mut config: EngineConfig = toml::from_str(&raw)
            .map_err(|e| ProjectionError::config_load(format!("{}: {e}", path.display())))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// The minimum floor configured for a (position, stat) pair.
    pub fn minimum_floor_for(&self, position: Position, stat: &str) -> Option<f64> {
        self.minimum_floors
            .get(&position)
            .and_then(|floors| floors.get(stat))
            .copied()
    }

    /// The recent-form window for a position.
    pub fn window_for(&self, position: Position) -> usize {
        self.rolling_window_by_position
            .get(&position)
            .copied()
            .unwrap_or(self.rolling_window)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>("PROJ_BOOTSTRAP_SAMPLES") {
            self.bootstrap.num_samples = v;
        }
        if let Some(v) = env_parse::<f64>("PROJ_CONFIDENCE") {
            self.bootstrap.confidence = v;
        }
        if let Some(v) = env_parse::<usize>("PROJ_MIN_GAMES") {
            self.min_games_played = v;
        }
        if let Some(v) = env_parse::<usize>("PROJ_ROLLING_WINDOW") {
            self.rolling_window = v;
        }
    }

    /// Validate every section, collecting all violations rather than
    /// stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.bootstrap.num_samples == 0 {
            errors.push("bootstrap.num_samples must be positive".to_string());
        }
        if self.bootstrap.confidence <= 0.0 || self.bootstrap.confidence >= 1.0 {
            errors.push(format!(
                "bootstrap.confidence must be in (0, 1), got {}",
                self.bootstrap.confidence
            ));
        }
        if self.min_games_played == 0 {
            errors.push("min_games_played must be positive".to_string());
        }
        if self.rolling_window == 0 {
            errors.push("rolling_window must be positive".to_string());
        }
        if self.confidence.high_min_games < self.confidence.medium_min_games {
            errors.push("confidence.high_min_games must be >= medium_min_games".to_string());
        }
        if self.confidence.high_max_cv > self.confidence.medium_max_cv {
            errors.push("confidence.high_max_cv must be <= medium_max_cv".to_string());
        }
        if self.smoothing.min_alpha <= 0.0 || self.smoothing.max_alpha >= 1.0 {
            errors.push("smoothing alpha bounds must lie strictly inside (0, 1)".to_string());
        }
        if self.smoothing.min_alpha > self.smoothing.max_alpha {
            errors.push("smoothing.min_alpha must be <= max_alpha".to_string());
        }
        let blend = self.smoothing.season_weight + self.smoothing.recent_weight;
        if (blend - 1.0).abs() > 1e-9 {
            errors.push(format!("smoothing blend weights must sum to 1.0, got {blend}"));
        }
        if self.trend.max_adjustment <= 0.0 || self.trend.max_adjustment >= 1.0 {
            errors.push("trend.max_adjustment must be in (0, 1)".to_string());
        }
        if self.trend.half_life_days <= 0.0 {
            errors.push("trend.half_life_days must be positive".to_string());
        }
        if self.regime.threshold <= 0.0 {
            errors.push("regime.threshold must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.regime.post_change_weight) {
            errors.push("regime.post_change_weight must be in [0, 1]".to_string());
        }
        if self.opponent.min_factor >= self.opponent.max_factor {
            errors.push("opponent.min_factor must be below max_factor".to_string());
        }
        if self.opponent.min_factor <= 0.0 {
            errors.push("opponent.min_factor must be positive".to_string());
        }
        if self.environment.min_factor >= self.environment.max_factor {
            errors.push("environment.min_factor must be below max_factor".to_string());
        }
        if self.environment.min_factor <= 0.0 {
            errors.push("environment.min_factor must be positive".to_string());
        }
        if self.efficiency.min_factor >= self.efficiency.max_factor {
            errors.push("efficiency.min_factor must be below max_factor".to_string());
        }
        if self.efficiency.min_factor <= 0.0 {
            errors.push("efficiency.min_factor must be positive".to_string());
        }
        if self.game_script.low_total >= self.game_script.high_total {
            errors.push("game_script.low_total must be below high_total".to_string());
        }
        for (status, p) in [
            ("out", self.participation.out_probability),
            ("doubtful", self.participation.doubtful_probability),
            ("questionable", self.participation.questionable_probability),
            ("probable", self.participation.probable_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("participation.{status}_probability must be in [0, 1]"));
            }
        }
        if !(0.0..=1.0).contains(&self.outliers.max_removed_share) {
            errors.push("outliers.max_removed_share must be in [0, 1]".to_string());
        }
        for (position, floors) in &self.minimum_floors {
            for (stat, floor) in floors {
                if *floor < 0.0 {
                    errors.push(format!(
                        "minimum_floors.{}.{stat} must be non-negative",
                        position.as_str()
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProjectionError::InvalidConfig(errors))
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
