//! # Flight Detector
//!
//! Per-move checks for unpermitted flight: fast ascent, fast airborne
//! horizontal travel and hovering. Entities that may fly, are levitating,
//! or touch a liquid or climbable at either end of the move are exempt and
//! their counters are left untouched.

use vigil_core::{BlockView, MoveSample, Position};

use super::{MoveContext, Verdict};
use crate::config::FlightConfig;
use crate::store::HysteresisCounters;

/// Speed violations before a report.
pub const SPEED_VIOLATIONS: u32 = 3;
/// Unpermitted toggles before a report.
pub const TOGGLE_VIOLATIONS: u32 = 2;
/// Vertical movement below this counts as hovering.
pub const HOVER_EPSILON: f64 = 0.1;

/// Why a move was flagged.
#[derive(Clone, Debug, PartialEq)]
pub enum FlightFinding {
    /// Rising faster than physics allows.
    Ascent {
        /// Upward delta of the sample.
        dy: f64,
        /// Configured maximum.
        limit: f64,
        /// Consecutive violations.
        violations: u32,
    },
    /// Travelling too fast while airborne.
    Airborne {
        /// Horizontal delta of the sample.
        horizontal: f64,
        /// Configured maximum.
        limit: f64,
        /// Consecutive violations.
        violations: u32,
    },
    /// Staying level in mid-air.
    Hover {
        /// Consecutive hover samples.
        samples: u32,
    },
    /// Flight switched on without permission.
    Toggle {
        /// Consecutive violations.
        violations: u32,
    },
}

impl std::fmt::Display for FlightFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascent { dy, limit, violations } => {
                write!(f, "flight: ascended {dy:.2} > {limit:.2} ({violations} consecutive)")
            }
            Self::Airborne { horizontal, limit, violations } => write!(
                f,
                "flight: airborne speed {horizontal:.2} > {limit:.2} ({violations} consecutive)"
            ),
            Self::Hover { samples } => write!(f, "flight: hovering for {samples} samples"),
            Self::Toggle { violations } => {
                write!(f, "flight enabled without permission ({violations} attempts)")
            }
        }
    }
}

/// Returns true if the move cannot be judged for flight.
#[must_use]
pub fn is_exempt(sample: &MoveSample, ctx: &MoveContext<'_>) -> bool {
    if ctx.flight_allowed || ctx.flying || ctx.levitating {
        return true;
    }
    [sample.from, sample.to].into_iter().any(|p| {
        let material = ctx.world.material_at_position(p);
        material.is_liquid() || material.is_climbable()
    })
}

/// Checks one move sample.
pub fn check_move(
    sample: &MoveSample,
    ctx: &MoveContext<'_>,
    config: &FlightConfig,
    counters: &mut HysteresisCounters,
) -> Verdict<FlightFinding> {
    if is_exempt(sample, ctx) {
        return Verdict::Inconclusive;
    }

    let dy = sample.vertical_delta();
    if dy > 0.0 && dy > config.max_vertical_speed {
        let violations = HysteresisCounters::bump(&mut counters.flight);
        return fire_at(violations, SPEED_VIOLATIONS, FlightFinding::Ascent {
            dy,
            limit: config.max_vertical_speed,
            violations,
        });
    }

    let horizontal = sample.horizontal_delta();
    if !on_ground(ctx.world, sample.to) && horizontal > config.max_horizontal_speed {
        let violations = HysteresisCounters::bump(&mut counters.flight);
        return fire_at(violations, SPEED_VIOLATIONS, FlightFinding::Airborne {
            horizontal,
            limit: config.max_horizontal_speed,
            violations,
        });
    }

    counters.flight = 0;

    let hovering = !on_ground(ctx.world, sample.from)
        && !on_ground(ctx.world, sample.to)
        && dy.abs() < HOVER_EPSILON;
    if !hovering {
        counters.hover = 0;
        return Verdict::Clean;
    }

    let samples = HysteresisCounters::bump(&mut counters.hover);
    if samples > config.min_hover_samples {
        Verdict::Flagged(FlightFinding::Hover { samples })
    } else {
        Verdict::Clean
    }
}

/// Checks a flight toggle. Only enabling flight without permission counts.
pub fn check_toggle(
    now_flying: bool,
    has_permission: bool,
    counters: &mut HysteresisCounters,
) -> Verdict<FlightFinding> {
    if !now_flying || has_permission {
        return Verdict::Clean;
    }
    let violations = HysteresisCounters::bump(&mut counters.flight);
    fire_at(violations, TOGGLE_VIOLATIONS, FlightFinding::Toggle { violations })
}

fn on_ground(world: &dyn BlockView, pos: Position) -> bool {
    world.is_on_ground(pos)
}

fn fire_at(count: u32, threshold: u32, finding: FlightFinding) -> Verdict<FlightFinding> {
    if count >= threshold {
        Verdict::Flagged(finding)
    } else {
        Verdict::Clean
    }
}
