//! # Click Rate Detector
//!
//! Left clicks per second over a sliding window.

use super::{hysteresis, Verdict};
use crate::config::AutoClickConfig;
use crate::store::HysteresisCounters;

/// Why a click was flagged.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickFinding {
    /// Observed clicks per second.
    pub per_second: f64,
    /// Configured maximum.
    pub limit: f64,
    /// Consecutive violations.
    pub violations: u32,
}

impl std::fmt::Display for ClickFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "auto-click: {:.1} clicks/s > {:.1} ({} consecutive)",
            self.per_second, self.limit, self.violations
        )
    }
}

/// Clicks per second for `count` clicks over `window_ms`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn clicks_per_second(count: usize, window_ms: u64) -> f64 {
    if window_ms == 0 {
        return 0.0;
    }
    count as f64 / (window_ms as f64 / 1000.0)
}

/// Checks the click rate after a click has been logged.
pub fn check(
    clicks_in_window: usize,
    config: &AutoClickConfig,
    counters: &mut HysteresisCounters,
) -> Verdict<ClickFinding> {
    let per_second = clicks_per_second(clicks_in_window, config.window_ms);
    let violated = per_second > config.max_clicks_per_second;
    match hysteresis(&mut counters.auto_click, violated, config.min_violations) {
        Some(violations) => Verdict::Flagged(ClickFinding {
            per_second,
            limit: config.max_clicks_per_second,
            violations,
        }),
        None => Verdict::Clean,
    }
}
