//! # Block View
//!
//! Read-only access to the host world's voxels. The engine only ever asks
//! "what material is at this voxel"; everything else is derived from the
//! material's properties.

use std::collections::HashMap;

use crate::material::Material;
use crate::position::{BlockPos, Position};

/// Read-only voxel lookup supplied by the host.
pub trait BlockView: Send + Sync {
    /// Returns the material at a voxel. Unloaded voxels should report `Air`.
    fn material_at(&self, pos: BlockPos) -> Material;

    /// Returns the material of the voxel containing `pos`.
    #[inline]
    fn material_at_position(&self, pos: Position) -> Material {
        self.material_at(pos.block())
    }

    /// Returns true if the voxel just beneath `pos` is solid.
    #[inline]
    fn is_on_ground(&self, pos: Position) -> bool {
        self.material_at_position(pos.below(0.1)).is_solid()
    }
}

/// A sparse in-memory world where every unset voxel is air.
///
/// Used by tests and the simulator; real hosts implement [`BlockView`]
/// over their own chunk storage.
#[derive(Clone, Debug, Default)]
pub struct SparseBlockMap {
    blocks: HashMap<BlockPos, Material>,
}

impl SparseBlockMap {
    /// Creates an empty (all-air) world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single voxel. Setting `Air` removes the entry.
    pub fn set(&mut self, pos: BlockPos, material: Material) {
        if material == Material::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, material);
        }
    }

    /// Fills the inclusive box between two corners.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, material: Material) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set(BlockPos::new(x, y, z), material);
                }
            }
        }
    }

    /// Builder form of [`Self::fill`].
    #[must_use]
    pub fn with_fill(mut self, a: BlockPos, b: BlockPos, material: Material) -> Self {
        self.fill(a, b, material);
        self
    }

    /// Returns the number of non-air voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if every voxel is air.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockView for SparseBlockMap {
    fn material_at(&self, pos: BlockPos) -> Material {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_air() {
        let world = SparseBlockMap::new();
        assert_eq!(world.material_at(BlockPos::new(1, 2, 3)), Material::Air);
        assert!(world.is_empty());
    }

    #[test]
    fn test_fill_and_ground() {
        let world = SparseBlockMap::new().with_fill(
            BlockPos::new(-2, 63, -2),
            BlockPos::new(2, 63, 2),
            Material::Stone,
        );

        assert_eq!(world.len(), 25);
        assert!(world.is_on_ground(Position::new(0.5, 64.0, 0.5)));
        assert!(!world.is_on_ground(Position::new(0.5, 66.0, 0.5)));
        assert!(!world.is_on_ground(Position::new(10.5, 64.0, 0.5)));
    }

    #[test]
    fn test_set_air_clears() {
        let mut world = SparseBlockMap::new();
        world.set(BlockPos::new(0, 0, 0), Material::Dirt);
        assert_eq!(world.len(), 1);
        world.set(BlockPos::new(0, 0, 0), Material::Air);
        assert!(world.is_empty());
    }
}
