//! Data model for the projection engine
//!
//! Inputs (observation series, modifier contexts, position baselines) and
//! the output `ProjectionResult`. All external data is passed in fully
//! resolved; the engine never performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// Skill positions the engine projects for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Qb,
    #[serde(rename = "RB")]
    Rb,
    #[serde(rename = "WR")]
    Wr,
    #[serde(rename = "TE")]
    Te,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Wr => "WR",
            Position::Te => "TE",
        }
    }

    /// Stat categories projected for this position. The bool flags
    /// opportunity-driven stats that respond to game-script volume.
    pub fn stat_categories(&self) -> &'static [StatCategory] {
        match self {
            Position::Qb => &[
                StatCategory { stat: "passing_yards", label: "Passing Yards", volume_sensitive: true },
                StatCategory { stat: "fantasy_points_ppr", label: "Fantasy Points", volume_sensitive: false },
            ],
            Position::Rb => &[
                StatCategory { stat: "rushing_yards", label: "Rushing Yards", volume_sensitive: true },
                StatCategory { stat: "receiving_yards", label: "Receiving Yards", volume_sensitive: true },
                StatCategory { stat: "fantasy_points_ppr", label: "Fantasy Points", volume_sensitive: false },
            ],
            Position::Wr | Position::Te => &[
                StatCategory { stat: "receiving_yards", label: "Receiving Yards", volume_sensitive: true },
                StatCategory { stat: "fantasy_points_ppr", label: "Fantasy Points", volume_sensitive: false },
            ],
        }
    }
}

/// One projectable stat for a position.
#[derive(Debug, Clone, Copy)]
pub struct StatCategory {
    pub stat: &'static str,
    pub label: &'static str,
    pub volume_sensitive: bool,
}

/// One player's recorded value for one stat in one completed game.
/// Immutable once recorded; `value` is `None` when the stat was not
/// tracked for that game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub value: Option<f64>,
    /// Chronological ordinal (week number).
    pub period_index: u32,
    /// Kickoff time, when known. Enables exact time-decay weighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Observation {
    pub fn new(value: Option<f64>, period_index: u32) -> Self {
        Self { value, period_index, timestamp: None }
    }

    pub fn with_timestamp(value: Option<f64>, period_index: u32, ts: DateTime<Utc>) -> Self {
        Self { value, period_index, timestamp: Some(ts) }
    }
}

/// Ordered, append-only series of observations for one (player, stat)
/// pair, ascending by `period_index`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from chronological observations. Out-of-order
    /// periods are rejected.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self> {
        let mut series = Self::new();
        for obs in observations {
            series.push(obs)?;
        }
        Ok(series)
    }

    /// Append the next observation. Periods must strictly increase.
    pub fn push(&mut self, obs: Observation) -> Result<()> {
        if let Some(last) = self.observations.last() {
            if obs.period_index <= last.period_index {
                return Err(ProjectionError::OutOfOrder {
                    period: obs.period_index,
                    last: last.period_index,
                });
            }
        }
        self.observations.push(obs);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Full-history view: every recorded (non-missing) value,
    /// chronological.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().filter_map(|o| o.value).collect()
    }

    /// Recent-window view: the last `n` observations, chronological.
    pub fn recent(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    /// Recorded values of the last `n` observations, chronological.
    pub fn recent_values(&self, n: usize) -> Vec<f64> {
        self.recent(n).iter().filter_map(|o| o.value).collect()
    }
}

/// Aggregate statistics over qualifying position peers, used only by the
/// shrinkage layer. Recomputed per batch by the caller; never stored in
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBaseline {
    /// Pooled mean over all peer game values.
    pub mean: f64,
    /// Variance of per-player means (between-player variance).
    pub between_variance: f64,
    /// Average game-to-game variance across peers (within-player).
    pub within_variance: f64,
    /// Number of qualifying peers.
    pub players: usize,
}

/// Caller-resolved opponent defensive aggregates over a rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentContext {
    /// Opponent's average yards allowed per game over the window.
    pub allowed_avg: f64,
    /// League average for the same window and scope.
    pub league_avg: f64,
    /// Games in the opponent's window (drives small-sample shrinkage).
    pub games: usize,
    /// True when the aggregate is position-specific rather than
    /// team-total.
    pub position_specific: bool,
}

/// Playing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Turf,
    Grass,
}

/// Stadium roof type. Retractable roofs are treated as domes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Roof {
    Dome,
    Retractable,
    Open,
}

/// Weather readings for an outdoor game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_f: Option<f64>,
    pub wind_mph: Option<f64>,
    #[serde(default)]
    pub precipitation: bool,
}

/// Game environment: venue and weather. Every field is optional; absent
/// data contributes a neutral sub-factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub is_home: Option<bool>,
    pub surface: Option<Surface>,
    pub roof: Option<Roof>,
    pub weather: Option<WeatherReading>,
}

/// Player play-efficiency versus a caller-supplied league distribution
/// for the same position and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyContext {
    /// Player's expected-points-added per play.
    pub player_epa: f64,
    pub league_mean: f64,
    pub league_std: f64,
    /// League data points behind the distribution.
    pub league_samples: usize,
}

/// Market lines for the specific game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub over_under: f64,
    /// Point spread from the home team's perspective (negative = home
    /// favored).
    pub spread: f64,
    /// Whether the projected player's team is at home.
    pub is_home: bool,
}

/// Injury report status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryStatus {
    Out,
    Doubtful,
    Questionable,
    Probable,
}

/// Injury report entry plus optional recent snap counts (chronological).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryContext {
    pub status: InjuryStatus,
    #[serde(default)]
    pub recent_snaps: Vec<u32>,
}

/// Participation estimate derived from an injury report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipationProfile {
    /// Probability the player participates (0.0 - 1.0).
    pub probability: f64,
    /// Confidence-reduction signal (1 - probability).
    pub confidence_reduction: f64,
}

impl ParticipationProfile {
    pub const NEUTRAL: ParticipationProfile =
        ParticipationProfile { probability: 1.0, confidence_reduction: 0.0 };
}

/// The independent scalar multipliers applied to a projection. Each
/// defaults to neutral when its supporting data was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierSet {
    pub opponent_factor: f64,
    pub environment_factor: f64,
    pub efficiency_factor: f64,
    pub volume_factor: f64,
    pub participation_probability: f64,
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self {
            opponent_factor: 1.0,
            environment_factor: 1.0,
            efficiency_factor: 1.0,
            volume_factor: 1.0,
            participation_probability: 1.0,
        }
    }
}

impl ModifierSet {
    /// The factor fed to the resampling estimator:
    /// opponent x environment x efficiency. Volume scales projected
    /// opportunity instead, and participation is applied post-hoc to the
    /// finished triple.
    pub fn combined(&self) -> f64 {
        self.opponent_factor * self.environment_factor * self.efficiency_factor
    }
}

/// Which resampling scheme produced an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorMethod {
    /// Per-point resampling (samples too small for blocks).
    #[serde(rename = "percentile")]
    Percentile,
    /// Contiguous-block resampling preserving autocorrelation.
    #[serde(rename = "percentile-block")]
    PercentileBlock,
}

impl EstimatorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorMethod::Percentile => "percentile",
            EstimatorMethod::PercentileBlock => "percentile-block",
        }
    }
}

/// Ordinal confidence classification for a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// One-notch downgrade, saturating at LOW. Applied when injury
    /// uncertainty reduces trust in the projection.
    pub fn downgraded(self) -> Self {
        match self {
            ConfidenceLevel::High => ConfidenceLevel::Medium,
            ConfidenceLevel::Medium | ConfidenceLevel::Low => ConfidenceLevel::Low,
        }
    }
}

/// Raw estimator output before orchestrator postprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInterval {
    pub floor: f64,
    pub expected: f64,
    pub ceiling: f64,
    pub sample_size: usize,
    pub bootstrap_samples: usize,
    pub interval_width: f64,
    pub coefficient_of_variation: f64,
    pub method: EstimatorMethod,
    pub modifier: f64,
}

impl PredictionInterval {
    /// Degenerate all-zero result for an empty sample.
    pub fn empty(modifier: f64, bootstrap_samples: usize) -> Self {
        Self {
            floor: 0.0,
            expected: 0.0,
            ceiling: 0.0,
            sample_size: 0,
            bootstrap_samples,
            interval_width: 0.0,
            coefficient_of_variation: 0.0,
            method: EstimatorMethod::Percentile,
            modifier,
        }
    }
}

/// Diagnostic fields carried alongside every projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDiagnostics {
    pub method: EstimatorMethod,
    pub modifiers: ModifierSet,
    pub trend_factor: f64,
    pub season_avg: f64,
    pub recent_avg: f64,
    /// Model-side expected value (blend/shrinkage/modifiers) before the
    /// estimator's median replaces it in the headline triple.
    pub model_expected: f64,
    pub ewma_alpha: f64,
    pub regime_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime_changepoint: Option<usize>,
    /// Weight kept on the player's own data by shrinkage (1.0 when no
    /// baseline was available).
    pub shrinkage_weight: f64,
    pub bootstrap_samples: usize,
    #[serde(default)]
    pub injury_adjusted: bool,
    #[serde(default)]
    pub minimum_floor_applied: bool,
}

/// The engine's output unit: a calibrated three-point estimate plus
/// diagnostics. Produced fresh on every invocation; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub stat: String,
    pub floor: f64,
    pub expected: f64,
    pub ceiling: f64,
    pub confidence_level: ConfidenceLevel,
    pub sample_size: usize,
    pub interval_width: f64,
    pub diagnostics: ProjectionDiagnostics,
}

/// Everything the orchestrator needs for one (player, stat) projection.
/// All external lookups are resolved by the caller beforehand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub position: Position,
    pub stat: String,
    pub series: ObservationSeries,
    /// Current period (week about to be played).
    pub current_period: u32,
    /// Reference time for trend decay; falls back to period arithmetic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PositionBaseline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<OpponentContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<EfficiencyContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury: Option<InjuryContext>,
    /// Whether this stat's opportunity volume responds to game script.
    #[serde(default)]
    pub volume_sensitive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_rejects_out_of_order_periods() {
        let mut series = ObservationSeries::new();
        series.push(Observation::new(Some(10.0), 1)).unwrap();
        series.push(Observation::new(Some(12.0), 2)).unwrap();
        let err = series.push(Observation::new(Some(9.0), 2));
        assert!(matches!(err, Err(ProjectionError::OutOfOrder { .. })));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn series_views_skip_missing_values() {
        let series = ObservationSeries::from_observations(vec![
            Observation::new(Some(10.0), 1),
            Observation::new(None, 2),
            Observation::new(Some(14.0), 3),
            Observation::new(Some(18.0), 4),
        ])
        .unwrap();
        assert_eq!(series.values(), vec![10.0, 14.0, 18.0]);
        assert_eq!(series.recent(2).len(), 2);
        assert_eq!(series.recent_values(3), vec![14.0, 18.0]);
    }

    #[test]
    fn combined_modifier_excludes_volume_and_participation() {
        let modifiers = ModifierSet {
            opponent_factor: 1.1,
            environment_factor: 0.95,
            efficiency_factor: 1.05,
            volume_factor: 1.1,
            participation_probability: 0.7,
        };
        let expected = 1.1 * 0.95 * 1.05;
        assert!((modifiers.combined() - expected).abs() < 1e-12);
    }

    #[test]
    fn confidence_downgrade_saturates_at_low() {
        assert_eq!(ConfidenceLevel::High.downgraded(), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::Medium.downgraded(), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Low.downgraded(), ConfidenceLevel::Low);
    }

    #[test]
    fn stat_table_flags_yardage_as_volume_sensitive() {
        let rb = Position::Rb.stat_categories();
        assert!(rb.iter().any(|c| c.stat == "rushing_yards" && c.volume_sensitive));
        assert!(rb.iter().any(|c| c.stat == "fantasy_points_ppr" && !c.volume_sensitive));
        let qb = Position::Qb.stat_categories();
        assert!(qb.iter().any(|c| c.stat == "passing_yards" && c.volume_sensitive));
    }

    #[test]
    fn method_tags_serialize_with_hyphen() {
        let json = serde_json::to_string(&EstimatorMethod::PercentileBlock).unwrap();
        assert_eq!(json, "\"percentile-block\"");
    }
}
