//! # Action Records
//!
//! Immutable records of a single observed action. Timestamps are wall-clock
//! milliseconds supplied by whoever observed the action.

use crate::material::Material;
use crate::position::{BlockPos, Position};
use crate::tool::Tool;

/// Wall-clock milliseconds.
pub type Millis = u64;

/// Anything carrying an observation timestamp.
pub trait Timestamped {
    /// Returns when the record was observed.
    fn timestamp(&self) -> Millis;
}

/// A block broken by an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakEvent {
    /// The voxel that was broken.
    pub location: BlockPos,
    /// The material of the broken block.
    pub material: Material,
    /// The tool held while breaking.
    pub tool: Tool,
    /// When the break was observed.
    pub timestamp: Millis,
}

impl BreakEvent {
    /// Creates a new break record.
    #[must_use]
    pub const fn new(location: BlockPos, material: Material, tool: Tool, timestamp: Millis) -> Self {
        Self {
            location,
            material,
            tool,
            timestamp,
        }
    }
}

/// One positional delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveSample {
    /// Position before the move.
    pub from: Position,
    /// Position after the move.
    pub to: Position,
    /// When the move was observed.
    pub timestamp: Millis,
}

impl MoveSample {
    /// Returns the horizontal distance covered.
    #[inline]
    #[must_use]
    pub fn horizontal_delta(&self) -> f64 {
        self.from.horizontal_distance(self.to)
    }

    /// Returns the signed vertical distance covered (positive is up).
    #[inline]
    #[must_use]
    pub fn vertical_delta(&self) -> f64 {
        self.to.y - self.from.y
    }
}

/// One interaction click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickSample {
    /// When the click was observed.
    pub timestamp: Millis,
}

/// One damage application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageSample {
    /// When the damage was applied.
    pub timestamp: Millis,
    /// Final damage after armour and effects.
    pub amount: f64,
}

/// Every kind of observed action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionEvent {
    /// A block was broken.
    Break(BreakEvent),
    /// The entity moved.
    Move(MoveSample),
    /// The entity clicked.
    Click(ClickSample),
    /// The entity took damage.
    Damage(DamageSample),
}

impl Timestamped for BreakEvent {
    fn timestamp(&self) -> Millis {
        self.timestamp
    }
}

impl Timestamped for MoveSample {
    fn timestamp(&self) -> Millis {
        self.timestamp
    }
}

impl Timestamped for ClickSample {
    fn timestamp(&self) -> Millis {
        self.timestamp
    }
}

impl Timestamped for DamageSample {
    fn timestamp(&self) -> Millis {
        self.timestamp
    }
}

impl Timestamped for ActionEvent {
    fn timestamp(&self) -> Millis {
        match self {
            Self::Break(e) => e.timestamp,
            Self::Move(e) => e.timestamp,
            Self::Click(e) => e.timestamp,
            Self::Damage(e) => e.timestamp,
        }
    }
}
