//! # Detectors
//!
//! Each detector is a pure function from evidence (and, for movement-class
//! checks, the entity's hysteresis counters) to a [`Verdict`]. Detectors
//! never log reports and never fail; too little evidence is
//! [`Verdict::Inconclusive`].
//!
//! | Detector | Path | Evidence |
//! |----------|------|----------|
//! | [`trace`] | batch | break log, 60 s |
//! | [`break_speed`] | batch | break log, detection window |
//! | [`flight`] | event | move sample + world |
//! | [`ground_speed`] | event | move sample + world |
//! | [`no_clip`] | event | move sample + world |
//! | [`click_rate`] | event | click log |
//! | [`damage`] | event | damage log |

use vigil_core::BlockView;

pub mod break_speed;
pub mod click_rate;
pub mod damage;
pub mod flight;
pub mod ground_speed;
pub mod no_clip;
pub mod stats;
pub mod trace;

/// Outcome of one detector run.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict<F> {
    /// Not enough evidence, or the entity is exempt from this check.
    Inconclusive,
    /// Evidence examined, nothing anomalous.
    Clean,
    /// Anomaly found.
    Flagged(F),
}

impl<F> Verdict<F> {
    /// Returns true if the verdict is [`Verdict::Flagged`].
    #[inline]
    #[must_use]
    pub const fn is_flagged(&self) -> bool {
        matches!(self, Self::Flagged(_))
    }

    /// Returns the finding, if any.
    #[must_use]
    pub fn flagged(self) -> Option<F> {
        match self {
            Self::Flagged(finding) => Some(finding),
            _ => None,
        }
    }
}

/// Per-move facts the host knows and the engine cannot derive.
#[derive(Clone, Copy)]
pub struct MoveContext<'a> {
    /// Voxel lookup around the entity.
    pub world: &'a dyn BlockView,
    /// The entity may fly.
    pub flight_allowed: bool,
    /// The entity is currently flying.
    pub flying: bool,
    /// A levitation effect is active.
    pub levitating: bool,
    /// The entity is sprinting.
    pub sprinting: bool,
    /// Speed effect level; 0 when no effect is active.
    pub speed_level: u8,
    /// The entity is outside the rules for this move (creative or
    /// spectator mode, bypass permission); no movement check runs.
    pub bypass: bool,
}

impl<'a> MoveContext<'a> {
    /// A walking entity with no effects or permissions.
    #[must_use]
    pub const fn new(world: &'a dyn BlockView) -> Self {
        Self {
            world,
            flight_allowed: false,
            flying: false,
            levitating: false,
            sprinting: false,
            speed_level: 0,
            bypass: false,
        }
    }

    /// Sets the sprint flag.
    #[must_use]
    pub const fn sprinting(mut self, sprinting: bool) -> Self {
        self.sprinting = sprinting;
        self
    }

    /// Sets the speed effect level.
    #[must_use]
    pub const fn with_speed_level(mut self, level: u8) -> Self {
        self.speed_level = level;
        self
    }

    /// Sets the flight permission and state.
    #[must_use]
    pub const fn with_flight(mut self, allowed: bool, flying: bool) -> Self {
        self.flight_allowed = allowed;
        self.flying = flying;
        self
    }

    /// Sets the levitation flag.
    #[must_use]
    pub const fn levitating(mut self, levitating: bool) -> Self {
        self.levitating = levitating;
        self
    }

    /// Sets the bypass flag.
    #[must_use]
    pub const fn bypassing(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }
}

impl std::fmt::Debug for MoveContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveContext")
            .field("flight_allowed", &self.flight_allowed)
            .field("flying", &self.flying)
            .field("levitating", &self.levitating)
            .field("sprinting", &self.sprinting)
            .field("speed_level", &self.speed_level)
            .field("bypass", &self.bypass)
            .finish_non_exhaustive()
    }
}

/// Applies one sample to a hysteresis counter.
///
/// A violation increments the counter and returns the new count once it
/// reaches `threshold`; a compliant sample resets it to zero.
#[inline]
pub(crate) fn hysteresis(counter: &mut u32, violated: bool, threshold: u32) -> Option<u32> {
    if violated {
        *counter = counter.saturating_add(1);
        (*counter >= threshold).then_some(*counter)
    } else {
        *counter = 0;
        None
    }
}
