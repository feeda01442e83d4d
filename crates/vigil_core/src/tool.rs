//! # Tools
//!
//! The item held while breaking a block. Tools are keyed in configuration
//! by their snake-case name (`"diamond_pickaxe"`, `"stone_shovel"`, `"hand"`).

use std::str::FromStr;
use thiserror::Error;

/// Material tier of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ToolTier {
    /// Wooden.
    Wooden = 0,
    /// Stone.
    Stone = 1,
    /// Iron.
    Iron = 2,
    /// Golden.
    Golden = 3,
    /// Diamond.
    Diamond = 4,
    /// Netherite.
    Netherite = 5,
}

/// Time to break one stone block with a pickaxe of each tier (ms).
const PICKAXE_BASE_MS: [u64; 6] = [3000, 2000, 1200, 600, 1000, 1000];

/// Base stone duration for anything that is not a pickaxe (ms).
const DEFAULT_BASE_MS: u64 = 2000;

impl ToolTier {
    const ALL: [Self; 6] = [
        Self::Wooden,
        Self::Stone,
        Self::Iron,
        Self::Golden,
        Self::Diamond,
        Self::Netherite,
    ];

    /// Returns the config-key prefix of this tier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wooden => "wooden",
            Self::Stone => "stone",
            Self::Iron => "iron",
            Self::Golden => "golden",
            Self::Diamond => "diamond",
            Self::Netherite => "netherite",
        }
    }
}

/// A held item, as far as block breaking is concerned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Bare hand.
    #[default]
    Hand,
    /// Pickaxe of the given tier.
    Pickaxe(ToolTier),
    /// Shovel of the given tier.
    Shovel(ToolTier),
    /// Axe of the given tier.
    Axe(ToolTier),
    /// Any other held item.
    Other,
}

impl Tool {
    /// Returns true for pickaxes, shovels and axes.
    #[inline]
    #[must_use]
    pub const fn is_mining_tool(self) -> bool {
        matches!(self, Self::Pickaxe(_) | Self::Shovel(_) | Self::Axe(_))
    }

    /// Returns the built-in time to break a baseline (stone) block, in ms.
    #[must_use]
    pub const fn base_duration_ms(self) -> u64 {
        match self {
            Self::Pickaxe(tier) => PICKAXE_BASE_MS[tier as usize],
            _ => DEFAULT_BASE_MS,
        }
    }

    /// Returns the snake-case config key for this tool.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Hand => "hand".to_string(),
            Self::Other => "other".to_string(),
            Self::Pickaxe(tier) => format!("{}_pickaxe", tier.name()),
            Self::Shovel(tier) => format!("{}_shovel", tier.name()),
            Self::Axe(tier) => format!("{}_axe", tier.name()),
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Error returned when a tool key is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "hand" => return Ok(Self::Hand),
            "other" => return Ok(Self::Other),
            _ => {}
        }

        let (tier_name, kind) = key
            .rsplit_once('_')
            .ok_or_else(|| UnknownTool(s.to_string()))?;
        let tier = ToolTier::ALL
            .into_iter()
            .find(|t| t.name() == tier_name)
            .ok_or_else(|| UnknownTool(s.to_string()))?;

        match kind {
            "pickaxe" => Ok(Self::Pickaxe(tier)),
            "shovel" => Ok(Self::Shovel(tier)),
            "axe" => Ok(Self::Axe(tier)),
            _ => Err(UnknownTool(s.to_string())),
        }
    }
}
