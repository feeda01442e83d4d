//! # Break Speed Detector
//!
//! Compares how fast an entity breaks blocks with how long its tool should
//! take. Events are grouped by tool; each group with enough samples is
//! checked against its expected duration:
//!
//! ```text
//! expected = override[tool]
//!          | base_duration(tool) * hardness_factor(first block of group)
//! ```

use vigil_core::{BreakEvent, Material, Millis, Tool};

use super::Verdict;
use crate::config::BreakSpeedConfig;

/// Breaks a tool group needs before it is evaluated.
pub const MIN_GROUP_EVENTS: usize = 5;
/// Gaps at or above this are idle time, not mining.
pub const MAX_GAP_MS: i64 = 10_000;
/// Consecutive fast gaps that flag a group.
pub const FAST_RUN: usize = 5;
/// Headroom applied on top of the configured speed multiplier.
pub const MULTIPLIER_MARGIN: f64 = 1.5;

/// Why a tool group was flagged.
#[derive(Clone, Debug, PartialEq)]
pub enum SpeedFinding {
    /// Average pace beats the expected duration by too much.
    Ratio {
        /// Tool of the group.
        tool: Tool,
        /// Expected break duration.
        expected_ms: Millis,
        /// Mean observed gap.
        actual_ms: f64,
        /// `expected / actual`.
        ratio: f64,
        /// Ratio that had to be exceeded.
        limit: f64,
    },
    /// Too many consecutive breaks under half the expected duration.
    ConsecutiveFast {
        /// Tool of the group.
        tool: Tool,
        /// Longest run of fast gaps.
        run: usize,
        /// Expected break duration.
        expected_ms: Millis,
    },
}

impl std::fmt::Display for SpeedFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ratio { tool, expected_ms, actual_ms, ratio, limit } => write!(
                f,
                "abnormal mining speed with {tool}: {actual_ms:.0}ms per block, expected {expected_ms}ms ({ratio:.2}x > {limit:.2}x)"
            ),
            Self::ConsecutiveFast { tool, run, expected_ms } => write!(
                f,
                "consecutive fast mining with {tool}: {run} breaks under {}ms",
                expected_ms / 2
            ),
        }
    }
}

/// Returns the expected time for `tool` to break `material`.
#[must_use]
pub fn expected_duration(tool: Tool, material: Material, config: &BreakSpeedConfig) -> Millis {
    config
        .duration_override(tool)
        .unwrap_or_else(|| tool.base_duration_ms() * material.hardness_class().factor())
}

/// Evaluates the break events of one detection window, in arrival order.
#[must_use]
pub fn evaluate(events: &[BreakEvent], config: &BreakSpeedConfig) -> Verdict<SpeedFinding> {
    let needed = usize::try_from(config.min_detection_count)
        .unwrap_or(usize::MAX)
        .saturating_mul(2);
    if events.len() < needed {
        return Verdict::Inconclusive;
    }

    let mut evaluated = false;
    for (tool, group) in group_by_tool(events) {
        if group.len() < MIN_GROUP_EVENTS {
            continue;
        }
        evaluated = true;

        let expected = expected_duration(tool, group[0].material, config);
        if let Some(finding) = check_group(tool, &group, expected, config) {
            return Verdict::Flagged(finding);
        }
    }

    if evaluated {
        Verdict::Clean
    } else {
        Verdict::Inconclusive
    }
}

fn check_group(
    tool: Tool,
    group: &[&BreakEvent],
    expected: Millis,
    config: &BreakSpeedConfig,
) -> Option<SpeedFinding> {
    if expected == 0 {
        return None;
    }

    let gaps: Vec<i64> = group.windows(2).map(|w| signed_gap(w[0], w[1])).collect();

    let mining: Vec<i64> = gaps.iter().copied().filter(|g| *g > 0 && *g < MAX_GAP_MS).collect();
    if mining.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let actual = mining.iter().sum::<i64>() as f64 / mining.len() as f64;

    #[allow(clippy::cast_precision_loss)]
    let ratio = expected as f64 / actual;
    let limit = config.normal_speed_multiplier * MULTIPLIER_MARGIN;
    if ratio > limit {
        return Some(SpeedFinding::Ratio {
            tool,
            expected_ms: expected,
            actual_ms: actual,
            ratio,
            limit,
        });
    }

    let half = i64::try_from(expected / 2).unwrap_or(i64::MAX);
    let run = longest_run(&gaps, |g| g < half);
    (run >= FAST_RUN).then_some(SpeedFinding::ConsecutiveFast {
        tool,
        run,
        expected_ms: expected,
    })
}

/// Groups events by tool, keeping first-seen tool order and arrival order
/// within each group.
fn group_by_tool(events: &[BreakEvent]) -> Vec<(Tool, Vec<&BreakEvent>)> {
    let mut groups: Vec<(Tool, Vec<&BreakEvent>)> = Vec::new();
    for event in events {
        match groups.iter_mut().find(|(tool, _)| *tool == event.tool) {
            Some((_, group)) => group.push(event),
            None => groups.push((event.tool, vec![event])),
        }
    }
    groups
}

#[allow(clippy::cast_possible_wrap)]
fn signed_gap(a: &BreakEvent, b: &BreakEvent) -> i64 {
    b.timestamp as i64 - a.timestamp as i64
}

fn longest_run(gaps: &[i64], fast: impl Fn(i64) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for &gap in gaps {
        if fast(gap) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
