//! # World Positions
//!
//! Continuous positions for moving entities and integer block coordinates
//! for voxels. World coordinates can reach tens of millions of units, so
//! positions are `f64`.

use serde::{Deserialize, Serialize};

/// A point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (east/west).
    pub x: f64,
    /// Y coordinate (height).
    pub y: f64,
    /// Z coordinate (north/south).
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the squared distance to another position.
    ///
    /// This avoids the sqrt call for distance comparisons.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Returns the straight-line distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns the distance to another position ignoring height.
    #[inline]
    #[must_use]
    pub fn horizontal_distance(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Returns this position shifted down by `dy`.
    #[inline]
    #[must_use]
    pub fn below(self, dy: f64) -> Self {
        Self::new(self.x, self.y - dy, self.z)
    }

    /// Returns the voxel containing this position.
    #[inline]
    #[must_use]
    pub fn block(self) -> BlockPos {
        BlockPos::from_position(self)
    }
}

/// Integer voxel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the voxel that contains a world position (floor on every axis).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_position(pos: Position) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }

    /// Returns the voxel's minimum corner as a world position.
    #[inline]
    #[must_use]
    pub fn to_position(self) -> Position {
        Position::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Returns the voxel directly beneath this one.
    #[inline]
    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 12.0, 4.0);

        assert!((a.distance(b) - 13.0).abs() < 1e-9);
        assert!((a.horizontal_distance(b) - 5.0).abs() < 1e-9);
        assert!((a.distance_squared(b) - 169.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_floors_negative_coordinates() {
        let pos = Position::new(-0.5, 64.99, 10.0);
        assert_eq!(pos.block(), BlockPos::new(-1, 64, 10));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(5.0, 6.0, 7.0);

        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Position::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_below_and_down() {
        let pos = Position::new(0.5, 65.0, 0.5);
        assert_eq!(pos.below(0.1).block(), BlockPos::new(0, 64, 0));
        assert_eq!(BlockPos::new(0, 65, 0).down(), BlockPos::new(0, 64, 0));
    }
}
