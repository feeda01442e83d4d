//! # Materials
//!
//! Block materials and the physical properties the detectors care about:
//! solidity, fluids, climbables, ice and mining hardness.
//!
//! Classification is table-driven. Each material maps to a
//! [`HardnessClass`], and the class indexes a factor table, so a new ore
//! only needs a row in [`Material::hardness_class`].

use serde::{Deserialize, Serialize};

/// A block material as reported by the host world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Empty space.
    #[default]
    Air,
    /// Water source or flow.
    Water,
    /// Lava source or flow.
    Lava,
    /// Natural stone.
    Stone,
    /// Cobblestone.
    Cobblestone,
    /// Deepslate.
    Deepslate,
    /// Dirt.
    Dirt,
    /// Grass-topped dirt.
    GrassBlock,
    /// Sand.
    Sand,
    /// Gravel.
    Gravel,
    /// Tree log.
    Log,
    /// Wooden planks.
    Planks,
    /// Glass.
    Glass,
    /// Netherrack.
    Netherrack,
    /// Unbreakable floor.
    Bedrock,
    /// Coal ore.
    CoalOre,
    /// Deepslate coal ore.
    DeepslateCoalOre,
    /// Iron ore.
    IronOre,
    /// Deepslate iron ore.
    DeepslateIronOre,
    /// Gold ore.
    GoldOre,
    /// Deepslate gold ore.
    DeepslateGoldOre,
    /// Redstone ore.
    RedstoneOre,
    /// Deepslate redstone ore.
    DeepslateRedstoneOre,
    /// Lapis ore.
    LapisOre,
    /// Deepslate lapis ore.
    DeepslateLapisOre,
    /// Diamond ore.
    DiamondOre,
    /// Deepslate diamond ore.
    DeepslateDiamondOre,
    /// Emerald ore.
    EmeraldOre,
    /// Deepslate emerald ore.
    DeepslateEmeraldOre,
    /// Nether gold ore.
    NetherGoldOre,
    /// Nether quartz ore.
    NetherQuartzOre,
    /// Ancient debris.
    AncientDebris,
    /// Short grass plant.
    Grass,
    /// Two-block grass plant.
    TallGrass,
    /// Fern.
    Fern,
    /// Two-block fern.
    LargeFern,
    /// Dead bush.
    DeadBush,
    /// Vines.
    Vine,
    /// Ladder.
    Ladder,
    /// Scaffolding.
    Scaffolding,
    /// Ice.
    Ice,
    /// Packed ice.
    PackedIce,
    /// Blue ice.
    BlueIce,
    /// Frosted ice.
    FrostedIce,
    /// Torch.
    Torch,
    /// Any other full block the host does not map explicitly.
    OtherSolid,
    /// Any other non-colliding block the host does not map explicitly.
    OtherPassable,
}

/// Mining hardness class used by the break-duration matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HardnessClass {
    /// Stone-equivalent blocks (and anything unclassified).
    Baseline = 0,
    /// Nether ores.
    NetherOre = 1,
    /// Iron, gold, redstone and lapis ores.
    MetalOre = 2,
    /// Diamond ore.
    Diamond = 3,
    /// Emerald ore.
    Emerald = 4,
    /// Ancient debris.
    AncientDebris = 5,
}

/// Break-duration multiplier per hardness class, indexed by discriminant.
const HARDNESS_FACTORS: [u64; 6] = [1, 2, 3, 15, 20, 30];

impl HardnessClass {
    /// Returns the multiplier applied to the tool's base stone duration.
    #[inline]
    #[must_use]
    pub const fn factor(self) -> u64 {
        HARDNESS_FACTORS[self as usize]
    }
}

impl Material {
    /// Returns true if the block collides with entities.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(
            self,
            Self::Air
                | Self::Water
                | Self::Lava
                | Self::Grass
                | Self::TallGrass
                | Self::Fern
                | Self::LargeFern
                | Self::DeadBush
                | Self::Vine
                | Self::Torch
                | Self::OtherPassable
        )
    }

    /// Returns true for fluids.
    #[inline]
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }

    /// Returns true for blocks an entity can climb.
    #[inline]
    #[must_use]
    pub const fn is_climbable(self) -> bool {
        matches!(self, Self::Ladder | Self::Vine | Self::Scaffolding)
    }

    /// Returns true for every ice variant.
    #[inline]
    #[must_use]
    pub const fn is_ice(self) -> bool {
        matches!(
            self,
            Self::Ice | Self::PackedIce | Self::BlueIce | Self::FrostedIce
        )
    }

    /// Returns true if an entity may legitimately occupy this voxel.
    ///
    /// Air, fluids, flora and climbables are permeable even when the world
    /// reports them as colliding.
    #[must_use]
    pub const fn is_permeable(self) -> bool {
        matches!(
            self,
            Self::Air
                | Self::Water
                | Self::Lava
                | Self::Grass
                | Self::TallGrass
                | Self::Fern
                | Self::LargeFern
                | Self::DeadBush
                | Self::Vine
                | Self::Ladder
                | Self::Scaffolding
        ) || !self.is_solid()
    }

    /// Returns the mining hardness class of this material.
    #[must_use]
    pub const fn hardness_class(self) -> HardnessClass {
        match self {
            Self::IronOre
            | Self::DeepslateIronOre
            | Self::GoldOre
            | Self::DeepslateGoldOre
            | Self::RedstoneOre
            | Self::DeepslateRedstoneOre
            | Self::LapisOre
            | Self::DeepslateLapisOre => HardnessClass::MetalOre,
            Self::NetherGoldOre | Self::NetherQuartzOre => HardnessClass::NetherOre,
            Self::DiamondOre | Self::DeepslateDiamondOre => HardnessClass::Diamond,
            Self::EmeraldOre | Self::DeepslateEmeraldOre => HardnessClass::Emerald,
            Self::AncientDebris => HardnessClass::AncientDebris,
            _ => HardnessClass::Baseline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluids_are_not_solid() {
        assert!(!Material::Water.is_solid());
        assert!(Material::Water.is_liquid());
        assert!(Material::Lava.is_liquid());
        assert!(!Material::Stone.is_liquid());
    }

    #[test]
    fn test_permeable_allowlist() {
        for material in [
            Material::Air,
            Material::Water,
            Material::Lava,
            Material::Grass,
            Material::TallGrass,
            Material::Fern,
            Material::LargeFern,
            Material::DeadBush,
            Material::Vine,
            Material::Ladder,
            Material::Scaffolding,
        ] {
            assert!(material.is_permeable(), "{material:?} should be permeable");
        }

        assert!(!Material::Stone.is_permeable());
        assert!(!Material::DiamondOre.is_permeable());
        assert!(!Material::OtherSolid.is_permeable());
    }

    #[test]
    fn test_climbables_and_ice() {
        assert!(Material::Ladder.is_climbable());
        assert!(Material::Scaffolding.is_climbable());
        assert!(!Material::Stone.is_climbable());
        assert!(Material::FrostedIce.is_ice());
        assert!(!Material::Glass.is_ice());
    }

    #[test]
    fn test_hardness_factors() {
        assert_eq!(Material::Stone.hardness_class().factor(), 1);
        assert_eq!(Material::CoalOre.hardness_class().factor(), 1);
        assert_eq!(Material::DeepslateIronOre.hardness_class().factor(), 3);
        assert_eq!(Material::NetherQuartzOre.hardness_class().factor(), 2);
        assert_eq!(Material::DiamondOre.hardness_class().factor(), 15);
        assert_eq!(Material::EmeraldOre.hardness_class().factor(), 20);
        assert_eq!(Material::AncientDebris.hardness_class().factor(), 30);
    }
}
