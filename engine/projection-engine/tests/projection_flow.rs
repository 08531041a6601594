//! End-to-end projection flow tests

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use projection_engine::{
    ConfidenceLevel, EngineConfig, EstimatorMethod, Observation, ObservationSeries, Position,
    ProjectionEngine, ProjectionRequest,
};
use projection_engine::models::{InjuryContext, InjuryStatus, OpponentContext};

fn series_of(values: &[f64]) -> ObservationSeries {
    let observations = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Observation::new(Some(v), i as u32 + 1))
        .collect();
    ObservationSeries::from_observations(observations).unwrap()
}

fn request_for(values: &[f64]) -> ProjectionRequest {
    ProjectionRequest {
        position: Position::Qb,
        stat: "passing_yards".to_string(),
        series: series_of(values),
        current_period: values.len() as u32 + 1,
        reference_time: None,
        baseline: None,
        opponent: None,
        environment: None,
        efficiency: None,
        market: None,
        injury: None,
        volume_sensitive: false,
    }
}

/// A softer-than-average opponent producing a 1.15 combined modifier.
fn soft_opponent() -> OpponentContext {
    OpponentContext { allowed_avg: 230.0, league_avg: 200.0, games: 8, position_specific: true }
}

#[test]
fn five_game_sample_with_soft_opponent() {
    let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
    let mut request = request_for(&[150.0, 200.0, 180.0, 220.0, 160.0]);
    request.opponent = Some(soft_opponent());

    let mut rng = StdRng::seed_from_u64(42);
    let result = engine.project(&request, &mut rng).unwrap();

    assert_eq!(result.diagnostics.method, EstimatorMethod::PercentileBlock);
    assert!((result.diagnostics.modifiers.opponent_factor - 1.15).abs() < 1e-9);

    // Sample mean 182 scaled by 1.15 is 209.3; the resampled median
    // should land within five percent of it.
    let target = 182.0 * 1.15;
    assert!((result.expected - target).abs() / target < 0.05);
    assert!(result.floor < 200.0);
    assert!(result.ceiling > 200.0);
    assert!(result.floor <= result.expected && result.expected <= result.ceiling);
    assert_eq!(result.sample_size, 5);
}

#[test]
fn seeded_runs_are_reproducible() {
    let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
    let mut request = request_for(&[150.0, 200.0, 180.0, 220.0, 160.0]);
    request.opponent = Some(soft_opponent());

    let mut rng_a = StdRng::seed_from_u64(7);
    let mut rng_b = StdRng::seed_from_u64(7);
    let a = engine.project(&request, &mut rng_a).unwrap();
    let b = engine.project(&request, &mut rng_b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn questionable_status_scales_exactly_and_reduces_confidence() {
    let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
    let values = [210.0, 230.0, 205.0, 250.0, 225.0, 215.0, 240.0, 220.0];

    let mut rng = StdRng::seed_from_u64(11);
    let healthy = engine.project(&request_for(&values), &mut rng).unwrap();

    let mut request = request_for(&values);
    request.injury =
        Some(InjuryContext { status: InjuryStatus::Questionable, recent_snaps: vec![] });
    let mut rng = StdRng::seed_from_u64(11);
    let hurt = engine.project(&request, &mut rng).unwrap();

    let round1 = |v: f64| (v * 10.0).round() / 10.0;
    assert_eq!(hurt.floor, round1(healthy.floor * 0.70));
    assert_eq!(hurt.expected, round1(healthy.expected * 0.70));
    assert_eq!(hurt.ceiling, round1(healthy.ceiling * 0.70));
    assert!(hurt.confidence_level < healthy.confidence_level);
}

#[test]
fn confidence_tracks_sample_size_and_spread() {
    let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();

    let steady = [212.0, 208.0, 215.0, 210.0, 206.0, 214.0, 209.0, 211.0, 213.0, 207.0];
    let mut rng = StdRng::seed_from_u64(5);
    let high = engine.project(&request_for(&steady), &mut rng).unwrap();
    assert_eq!(high.confidence_level, ConfidenceLevel::High);

    let scattered = [40.0, 240.0, 95.0];
    let mut rng = StdRng::seed_from_u64(5);
    let low = engine.project(&request_for(&scattered), &mut rng).unwrap();
    assert_eq!(low.confidence_level, ConfidenceLevel::Low);
}

#[test]
fn minimum_floor_applies_to_low_output_passers() {
    let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
    // Backup-level passing output across half a season.
    let values = [90.0, 140.0, 75.0, 120.0, 95.0, 110.0, 85.0, 130.0];
    let mut rng = StdRng::seed_from_u64(23);
    let result = engine.project(&request_for(&values), &mut rng).unwrap();
    assert!(result.floor >= 120.0);
    assert!(result.diagnostics.minimum_floor_applied);
    assert!(result.floor <= result.expected && result.expected <= result.ceiling);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn triple_ordering_always_holds(
        values in proptest::collection::vec(0.0f64..400.0, 3..16),
        seed in any::<u64>(),
    ) {
        let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
        let mut request = request_for(&values);
        request.opponent = Some(soft_opponent());
        let mut rng = StdRng::seed_from_u64(seed);
        if let Some(result) = engine.project(&request, &mut rng) {
            prop_assert!(result.floor <= result.expected);
            prop_assert!(result.expected <= result.ceiling);
            prop_assert!(result.diagnostics.modifiers.participation_probability == 1.0);
        }
    }

    #[test]
    fn participation_never_increases_the_triple(
        values in proptest::collection::vec(10.0f64..300.0, 5..12),
        seed in any::<u64>(),
    ) {
        let engine = ProjectionEngine::new(EngineConfig::default()).unwrap();
        let healthy_req = request_for(&values);
        let mut hurt_req = request_for(&values);
        hurt_req.injury = Some(InjuryContext {
            status: InjuryStatus::Doubtful,
            recent_snaps: vec![],
        });
        let mut rng = StdRng::seed_from_u64(seed);
        let healthy = engine.project(&healthy_req, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let hurt = engine.project(&hurt_req, &mut rng).unwrap();
        prop_assert!(hurt.expected <= healthy.expected);
        prop_assert!(hurt.ceiling <= healthy.ceiling);
        prop_assert!(hurt.confidence_level <= healthy.confidence_level);
    }
}
