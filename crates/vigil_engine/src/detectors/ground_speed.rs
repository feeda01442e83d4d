//! # Ground Speed Detector
//!
//! Horizontal distance per move sample against the walk or sprint limit,
//! scaled by the speed effect level. Moves touching a liquid or ice at
//! either end are not judged.

use vigil_core::{BlockView, MoveSample, Position};

use super::{hysteresis, MoveContext, Verdict};
use crate::config::GroundSpeedConfig;
use crate::store::HysteresisCounters;

/// Limit increase per speed effect level.
pub const EFFECT_BONUS_PER_LEVEL: f64 = 0.2;

/// Why a move was flagged.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundSpeedFinding {
    /// Horizontal delta of the sample.
    pub speed: f64,
    /// Effective limit.
    pub limit: f64,
    /// Consecutive violations.
    pub violations: u32,
}

impl std::fmt::Display for GroundSpeedFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "speed: {:.3} > {:.3} ({} consecutive)",
            self.speed, self.limit, self.violations
        )
    }
}

/// Returns the speed limit for a context.
#[must_use]
pub fn limit(ctx: &MoveContext<'_>, config: &GroundSpeedConfig) -> f64 {
    let base = if ctx.sprinting {
        config.max_sprint_speed
    } else {
        config.max_walk_speed
    };
    base * (1.0 + EFFECT_BONUS_PER_LEVEL * f64::from(ctx.speed_level))
}

/// Returns true if the move touches a liquid or ice at either end.
#[must_use]
pub fn is_exempt(sample: &MoveSample, world: &dyn BlockView) -> bool {
    [sample.from, sample.to]
        .into_iter()
        .any(|p| slippery_or_fluid(world, p))
}

fn slippery_or_fluid(world: &dyn BlockView, pos: Position) -> bool {
    let feet = pos.block();
    [feet, feet.down()].into_iter().any(|b| {
        let material = world.material_at(b);
        material.is_liquid() || material.is_ice()
    })
}

/// Checks one move sample.
pub fn check(
    sample: &MoveSample,
    ctx: &MoveContext<'_>,
    config: &GroundSpeedConfig,
    counters: &mut HysteresisCounters,
) -> Verdict<GroundSpeedFinding> {
    if is_exempt(sample, ctx.world) {
        return Verdict::Inconclusive;
    }

    let speed = sample.horizontal_delta();
    let limit = limit(ctx, config);
    match hysteresis(&mut counters.ground_speed, speed > limit, config.min_violations) {
        Some(violations) => Verdict::Flagged(GroundSpeedFinding {
            speed,
            limit,
            violations,
        }),
        None => Verdict::Clean,
    }
}
