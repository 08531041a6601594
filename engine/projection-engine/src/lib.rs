//! Statistical projection engine for per-game player output
//!
//! Produces calibrated floor/expected/ceiling triples from historical
//! per-game observations, adjusted for opponent strength, environment,
//! usage trend, play efficiency, game script, and injury participation.
//!
//! The engine is stateless and synchronous: callers resolve all external
//! data (opponent aggregates, league distributions, market lines, injury
//! reports) beforehand and pass it in as plain values. Randomness is
//! injected, so seeded runs are fully reproducible.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod modifiers;
pub mod regime;
pub mod shrinkage;
pub mod smoothing;
pub mod stats;

pub use config::{BootstrapConfig, ConfidenceThresholds, EngineConfig, Statistic};
pub use engine::ProjectionEngine;
pub use error::{ProjectionError, Result};
pub use models::{
    ConfidenceLevel, EstimatorMethod, ModifierSet, Observation, ObservationSeries,
    ParticipationProfile, Position, PositionBaseline, PredictionInterval, ProjectionRequest,
    ProjectionResult,
};
