//! # Mining Trace Detector
//!
//! Geometric and temporal analysis of an entity's recent break trajectory.
//! Rules are evaluated in order and the first match is the justification:
//!
//! 1. **Volume**: too many breaks in the window
//! 2. **Vertical tunnel**: a straight shaft dug downwards
//! 3. **Linearity**: break positions lie on a line
//! 4. **Regular timing**: inter-break intervals barely vary
//! 5. **Density**: breaks per second over the trajectory's time span
//!
//! Thresholds for the last three scale with the configured sensitivity.

use vigil_core::{BreakEvent, Position};

use super::stats::{coefficient_of_variation, mean, pearson, variance};
use super::Verdict;
use crate::config::TraceConfig;

/// Breaks required in the window before any verdict.
pub const MIN_EVENTS: usize = 10;
/// Breaks above which the window is flagged outright.
pub const VOLUME_LIMIT: usize = 50;
/// Largest X/Z variance of a vertical shaft.
pub const VERTICAL_AXIS_VARIANCE: f64 = 2.0;
/// Points a vertical shaft needs.
pub const VERTICAL_MIN_POINTS: usize = 10;
/// Net descent a vertical shaft must exceed.
pub const VERTICAL_MIN_DESCENT: f64 = 20.0;
/// Points the linearity rule needs.
pub const LINEAR_MIN_POINTS: usize = 5;
/// Breaks the timing rule needs.
pub const TIMING_MIN_EVENTS: usize = 6;

/// Why a trajectory was flagged.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceFinding {
    /// Too many breaks in the window.
    Volume {
        /// Breaks in the window.
        count: usize,
    },
    /// A straight downward shaft.
    VerticalTunnel {
        /// First Y minus last Y.
        descent: f64,
        /// Breaks in the shaft.
        points: usize,
    },
    /// Break positions lie on a line.
    Linear {
        /// Linearity score in `[0, 1]`.
        score: f64,
        /// Score that had to be exceeded.
        threshold: f64,
    },
    /// Inter-break intervals are machine-regular.
    RegularTiming {
        /// Coefficient of variation of the intervals.
        variation: f64,
        /// Value that had to be undercut.
        threshold: f64,
    },
    /// Breaks per second are too high.
    Density {
        /// Observed breaks per second.
        per_second: f64,
        /// Rate that had to be exceeded.
        threshold: f64,
    },
}

impl std::fmt::Display for TraceFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Volume { count } => write!(f, "excessive mining volume: {count} blocks in window"),
            Self::VerticalTunnel { descent, points } => {
                write!(f, "vertical tunnelling: descended {descent:.0} blocks over {points} breaks")
            }
            Self::Linear { score, threshold } => {
                write!(f, "linear mining trajectory: score {score:.3} > {threshold:.3}")
            }
            Self::RegularTiming { variation, threshold } => {
                write!(f, "regular mining rhythm: interval variation {variation:.3} < {threshold:.3}")
            }
            Self::Density { per_second, threshold } => {
                write!(f, "abnormal mining density: {per_second:.2}/s > {threshold:.2}/s")
            }
        }
    }
}

/// Evaluates the break events of one window, in arrival order.
#[must_use]
pub fn evaluate(events: &[BreakEvent], config: &TraceConfig) -> Verdict<TraceFinding> {
    let count = events.len();
    if count < MIN_EVENTS {
        return Verdict::Inconclusive;
    }

    if count > VOLUME_LIMIT {
        return Verdict::Flagged(TraceFinding::Volume { count });
    }

    let offset = config.sensitivity_offset();
    let points: Vec<Position> = events.iter().map(|e| e.location.to_position()).collect();

    match classify_shaft(&points) {
        Shaft::Deep(finding) => return Verdict::Flagged(finding),
        // A shaft too shallow to flag skips the linearity rule.
        Shaft::Shallow => {}
        Shaft::NotShaft => {
            if points.len() >= LINEAR_MIN_POINTS {
                let score = linearity_score(&points);
                let threshold = 0.9 + offset * 0.03;
                if score > threshold {
                    return Verdict::Flagged(TraceFinding::Linear { score, threshold });
                }
            }
        }
    }

    if count >= TIMING_MIN_EVENTS {
        let variation = coefficient_of_variation(&intervals(events));
        let threshold = 0.2 - offset * 0.03;
        if variation < threshold {
            return Verdict::Flagged(TraceFinding::RegularTiming { variation, threshold });
        }
    }

    if let Some(per_second) = density(events) {
        let threshold = 3.0 + offset * 0.3;
        if per_second > threshold {
            return Verdict::Flagged(TraceFinding::Density { per_second, threshold });
        }
    }

    Verdict::Clean
}

enum Shaft {
    NotShaft,
    Shallow,
    Deep(TraceFinding),
}

/// X and Z nearly fixed while Y only ever descends.
fn classify_shaft(points: &[Position]) -> Shaft {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Shaft::NotShaft;
    };

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let zs: Vec<f64> = points.iter().map(|p| p.z).collect();
    let non_increasing = points.windows(2).all(|w| w[1].y <= w[0].y);

    let is_shaft = variance(&xs) < VERTICAL_AXIS_VARIANCE
        && variance(&zs) < VERTICAL_AXIS_VARIANCE
        && non_increasing
        && last.y < first.y;
    if !is_shaft {
        return Shaft::NotShaft;
    }

    let descent = first.y - last.y;
    if points.len() >= VERTICAL_MIN_POINTS && descent > VERTICAL_MIN_DESCENT {
        Shaft::Deep(TraceFinding::VerticalTunnel {
            descent,
            points: points.len(),
        })
    } else {
        Shaft::Shallow
    }
}

/// Mean absolute Pearson correlation over the axis pairs (xy, xz, yz)
/// whose axes both vary. 0 when no pair qualifies.
///
/// Points along a diagonal score 1; points strung along a single axis
/// score 0, since no pair has variance on both sides.
#[must_use]
pub fn linearity_score(points: &[Position]) -> f64 {
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let zs: Vec<f64> = points.iter().map(|p| p.z).collect();

    let correlations: Vec<f64> = [(&xs, &ys), (&xs, &zs), (&ys, &zs)]
        .into_iter()
        .filter_map(|(a, b)| pearson(a, b))
        .map(f64::abs)
        .collect();

    mean(&correlations)
}

/// Signed gaps between consecutive events, in arrival order.
#[allow(clippy::cast_precision_loss)]
fn intervals(events: &[BreakEvent]) -> Vec<f64> {
    events
        .windows(2)
        .map(|w| w[1].timestamp as f64 - w[0].timestamp as f64)
        .collect()
}

/// Events per second over the span between the first and last event.
#[allow(clippy::cast_precision_loss)]
fn density(events: &[BreakEvent]) -> Option<f64> {
    let (first, last) = (events.first()?, events.last()?);
    if last.timestamp <= first.timestamp {
        return None;
    }
    let span_s = (last.timestamp - first.timestamp) as f64 / 1000.0;
    Some(events.len() as f64 / span_s)
}
