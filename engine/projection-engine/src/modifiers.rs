//! Scalar modifier calculators
//!
//! Each calculator is a pure function of optional context data returning
//! a multiplicative factor, neutral (1.0) when its data is absent. They
//! are independent of each other; the orchestrator decides which product
//! feeds the estimator.

use tracing::trace;

use crate::config::{
    EfficiencyConfig, EnvironmentConfig, GameScriptConfig, OpponentFactorConfig,
    ParticipationConfig,
};
use crate::models::{
    EfficiencyContext, EnvironmentContext, InjuryContext, InjuryStatus, MarketContext,
    OpponentContext, ParticipationProfile, Roof,
};

/// Opponent defensive-strength factor: the ratio of the opponent's
/// yards allowed to the league average, shrunk toward neutral when the
/// opponent's window is short, then clamped.
pub fn opponent_factor(context: Option<&OpponentContext>, config: &OpponentFactorConfig) -> f64 {
    let Some(ctx) = context else {
        return 1.0;
    };
    if ctx.league_avg <= 0.0 || ctx.allowed_avg < 0.0 {
        return 1.0;
    }
    let raw = ctx.allowed_avg / ctx.league_avg;
    let factor = if ctx.games < config.min_sample {
        // Not enough opponent games: trust the ratio proportionally.
        let trust = ctx.games as f64 / config.min_sample as f64;
        trust * raw + (1.0 - trust) * config.target_mean
    } else {
        raw
    };
    let clamped = factor.clamp(config.min_factor, config.max_factor);
    trace!(raw, clamped, games = ctx.games, position_specific = ctx.position_specific, "opponent factor");
    clamped
}

fn importance_scale(config: &EnvironmentConfig, key: &str) -> f64 {
    let importance = config.learned_importance.get(key).copied().unwrap_or(0.25);
    1.0 + (importance - 0.25) * 0.2
}

/// Rescale one sub-factor's distance from neutral by its learned
/// importance: conditions that historically mattered more push further
/// from 1.0, conditions that didn't are muted.
fn weighted(sub_factor: f64, config: &EnvironmentConfig, key: &str) -> f64 {
    1.0 + (sub_factor - 1.0) * importance_scale(config, key)
}

/// Environment factor: product of home/away, surface, roof, and weather
/// sub-factors, each rescaled by learned importance, then clamped.
/// Weather penalties apply only to outdoor games.
pub fn environment_factor(context: Option<&EnvironmentContext>, config: &EnvironmentConfig) -> f64 {
    let Some(ctx) = context else {
        return 1.0;
    };
    let mut factor = 1.0;

    if let Some(is_home) = ctx.is_home {
        let sub = if is_home { config.home_factor } else { config.away_factor };
        factor *= weighted(sub, config, "home");
    }
    if let Some(surface) = ctx.surface {
        let sub = match surface {
            crate::models::Surface::Turf => config.turf_factor,
            crate::models::Surface::Grass => config.grass_factor,
        };
        factor *= weighted(sub, config, "surface");
    }

    let indoors = matches!(ctx.roof, Some(Roof::Dome) | Some(Roof::Retractable));
    if let Some(roof) = ctx.roof {
        let sub = match roof {
            Roof::Dome | Roof::Retractable => config.dome_factor,
            Roof::Open => config.outdoor_factor,
        };
        factor *= weighted(sub, config, "roof");
    }

    if !indoors {
        if let Some(weather) = &ctx.weather {
            let mut sub = 1.0;
            if weather.wind_mph.is_some_and(|w| w >= config.wind_threshold_mph) {
                sub *= config.high_wind_factor;
            }
            if weather.temperature_f.is_some_and(|t| t <= config.cold_threshold_f) {
                sub *= config.cold_factor;
            }
            if weather.precipitation {
                sub *= config.precipitation_factor;
            }
            factor *= weighted(sub, config, "weather");
        }
    }

    factor.clamp(config.min_factor, config.max_factor)
}

/// Play-efficiency factor from the player's EPA standardized against the
/// league distribution. Neutral when the league sample is too small or
/// the distribution is degenerate.
pub fn efficiency_factor(context: Option<&EfficiencyContext>, config: &EfficiencyConfig) -> f64 {
    let Some(ctx) = context else {
        return 1.0;
    };
    if ctx.league_samples < config.min_league_samples || ctx.league_std <= 0.0 {
        return 1.0;
    }
    let z = (ctx.player_epa - ctx.league_mean) / ctx.league_std;
    (1.0 + z * config.weight_per_sigma).clamp(config.min_factor, config.max_factor)
}

/// Implied points total for the player's team from the market lines.
/// Over/under splits evenly, then half the spread moves from the
/// underdog to the favorite.
pub fn implied_team_total(market: &MarketContext) -> f64 {
    let home_total = market.over_under / 2.0 - market.spread / 2.0;
    if market.is_home {
        home_total
    } else {
        market.over_under - home_total
    }
}

/// Game-script volume factor: opportunity scales up in projected
/// shootouts and down in projected low-scoring games.
pub fn volume_factor(context: Option<&MarketContext>, config: &GameScriptConfig) -> f64 {
    let Some(market) = context else {
        return 1.0;
    };
    if market.over_under <= 0.0 {
        return 1.0;
    }
    let total = implied_team_total(market);
    if total > config.high_total {
        1.0 + config.adjustment
    } else if total < config.low_total {
        1.0 - config.adjustment
    } else {
        1.0
    }
}

/// Snap-share direction over the recent games: rising, falling sharply,
/// or steady.
fn snap_trend(snaps: &[u32]) -> std::cmp::Ordering {
    if snaps.len() < 2 {
        return std::cmp::Ordering::Equal;
    }
    let half = snaps.len() / 2;
    let older = snaps[..half].iter().sum::<u32>() as f64 / half as f64;
    let newer = snaps[half..].iter().sum::<u32>() as f64 / (snaps.len() - half) as f64;
    if newer > older * 1.1 {
        std::cmp::Ordering::Greater
    } else if newer < older * 0.75 {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Equal
    }
}

/// Participation probability from the injury report. Questionable
/// players get a snap-trend adjustment on top of the status prior;
/// definitive statuses do not.
pub fn participation_profile(
    context: Option<&InjuryContext>,
    config: &ParticipationConfig,
) -> ParticipationProfile {
    let Some(ctx) = context else {
        return ParticipationProfile::NEUTRAL;
    };
    let base = match ctx.status {
        InjuryStatus::Out => config.out_probability,
        InjuryStatus::Doubtful => config.doubtful_probability,
        InjuryStatus::Questionable => config.questionable_probability,
        InjuryStatus::Probable => config.probable_probability,
    };
    let probability = if ctx.status == InjuryStatus::Questionable {
        match snap_trend(&ctx.recent_snaps) {
            std::cmp::Ordering::Greater => base + config.rising_snaps_bonus,
            std::cmp::Ordering::Less => base - config.falling_snaps_penalty,
            std::cmp::Ordering::Equal => base,
        }
    } else {
        base
    }
    .clamp(0.0, 1.0);

    ParticipationProfile { probability, confidence_reduction: 1.0 - probability }
}
