//! # Damage Anomaly Detector
//!
//! An entity that survives far more damage than its maximum health within
//! a short window is ignoring damage.

use super::Verdict;
use crate::config::GodModeConfig;

/// Why a damage sample was flagged.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageFinding {
    /// Damage taken inside the window.
    pub total: f64,
    /// Damage that had to be exceeded.
    pub limit: f64,
}

impl std::fmt::Display for DamageFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "god mode: survived {:.1} damage in window, limit {:.1}",
            self.total, self.limit
        )
    }
}

/// Checks the damage total of the window.
#[must_use]
pub fn check(window_total: f64, max_health: f64, config: &GodModeConfig) -> Verdict<DamageFinding> {
    if !max_health.is_finite() || max_health <= 0.0 {
        return Verdict::Inconclusive;
    }
    let limit = config.health_multiplier * max_health;
    if window_total > limit {
        Verdict::Flagged(DamageFinding {
            total: window_total,
            limit,
        })
    } else {
        Verdict::Clean
    }
}
