//! # No-Clip Detector
//!
//! Walks the straight path of a move and flags any voxel an entity could
//! not legally occupy. Moves longer than `no_clip.max_distance` are
//! teleports, not walks, and are never marched.

use vigil_core::{BlockPos, BlockView, Material, MoveSample};

use super::{hysteresis, Verdict};
use crate::config::NoClipConfig;
use crate::store::HysteresisCounters;

/// Moves shorter than this are not sampled.
pub const MIN_DISTANCE: f64 = 0.1;

/// Why a move was flagged.
#[derive(Clone, Debug, PartialEq)]
pub struct NoClipFinding {
    /// First solid voxel on the path.
    pub block: BlockPos,
    /// Its material.
    pub material: Material,
    /// Consecutive violations.
    pub violations: u32,
}

impl std::fmt::Display for NoClipFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no-clip: passed through {:?} at {} ({} consecutive)",
            self.material, self.block, self.violations
        )
    }
}

/// Returns the first impermeable voxel on the path, sampling
/// `ceil(distance) + 1` evenly spaced points including both endpoints.
///
/// The march is linear in the distance; [`check`] bounds it.
#[must_use]
pub fn first_intersection(sample: &MoveSample, world: &dyn BlockView) -> Option<(BlockPos, Material)> {
    let distance = sample.from.distance(sample.to);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = distance.ceil().max(1.0) as u32;

    (0..=steps).find_map(|i| {
        let t = f64::from(i) / f64::from(steps);
        let block = sample.from.lerp(sample.to, t).block();
        let material = world.material_at(block);
        (!material.is_permeable()).then_some((block, material))
    })
}

/// Checks one move sample.
pub fn check(
    sample: &MoveSample,
    world: &dyn BlockView,
    config: &NoClipConfig,
    counters: &mut HysteresisCounters,
) -> Verdict<NoClipFinding> {
    let distance = sample.from.distance(sample.to);
    if !distance.is_finite() || distance < MIN_DISTANCE || distance > config.max_distance {
        return Verdict::Inconclusive;
    }

    let hit = first_intersection(sample, world);
    let fired = hysteresis(&mut counters.no_clip, hit.is_some(), config.min_violations);
    match (hit, fired) {
        (Some((block, material)), Some(violations)) => Verdict::Flagged(NoClipFinding {
            block,
            material,
            violations,
        }),
        _ => Verdict::Clean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Position, SparseBlockMap};

    fn wall() -> SparseBlockMap {
        SparseBlockMap::new().with_fill(BlockPos::new(2, 64, -3), BlockPos::new(2, 66, 3), Material::Stone)
    }

    fn through_wall() -> MoveSample {
        MoveSample {
            from: Position::new(1.5, 64.0, 0.5),
            to: Position::new(3.5, 64.0, 0.5),
            timestamp: 0,
        }
    }

    #[test]
    fn test_midpoint_in_wall() {
        let world = wall();
        assert_eq!(
            first_intersection(&through_wall(), &world),
            Some((BlockPos::new(2, 64, 0), Material::Stone))
        );
    }

    #[test]
    fn test_fires_after_min_then_resets() {
        let world = wall();
        let config = NoClipConfig::default();
        let mut counters = HysteresisCounters::default();

        assert_eq!(check(&through_wall(), &world, &config, &mut counters), Verdict::Clean);
        assert_eq!(check(&through_wall(), &world, &config, &mut counters), Verdict::Clean);
        assert!(matches!(
            check(&through_wall(), &world, &config, &mut counters),
            Verdict::Flagged(NoClipFinding { violations: 3, .. })
        ));

        let clean = MoveSample {
            from: Position::new(1.5, 70.0, 0.5),
            to: Position::new(3.5, 70.0, 0.5),
            timestamp: 0,
        };
        assert_eq!(check(&clean, &world, &config, &mut counters), Verdict::Clean);
        assert_eq!(counters.no_clip, 0);
    }

    #[test]
    fn test_permeable_blocks_pass() {
        let world = SparseBlockMap::new()
            .with_fill(BlockPos::new(2, 64, 0), BlockPos::new(2, 64, 0), Material::TallGrass)
            .with_fill(BlockPos::new(3, 64, 0), BlockPos::new(3, 64, 0), Material::Water);
        assert_eq!(first_intersection(&through_wall(), &world), None);
    }

    #[test]
    fn test_tiny_moves_skip() {
        let world = wall();
        let mut counters = HysteresisCounters { no_clip: 2, ..Default::default() };
        let jitter = MoveSample {
            from: Position::new(2.5, 64.0, 0.5),
            to: Position::new(2.55, 64.0, 0.5),
            timestamp: 0,
        };
        assert_eq!(check(&jitter, &world, &NoClipConfig::default(), &mut counters), Verdict::Inconclusive);
        assert_eq!(counters.no_clip, 2);
    }

    #[test]
    fn test_teleports_are_not_marched() {
        let world = wall();
        let config = NoClipConfig::default();
        let mut counters = HysteresisCounters { no_clip: 2, ..Default::default() };
        let teleport = MoveSample {
            from: Position::new(0.5, 64.0, 0.5),
            to: Position::new(29_000_000.5, 64.0, 0.5),
            timestamp: 0,
        };
        assert_eq!(check(&teleport, &world, &config, &mut counters), Verdict::Inconclusive);
        assert_eq!(counters.no_clip, 2);

        // Just over the cap through the wall is still skipped.
        let long_walk = MoveSample {
            from: Position::new(1.5, 64.0, 0.5),
            to: Position::new(1.5 + config.max_distance + 0.5, 64.0, 0.5),
            timestamp: 0,
        };
        assert_eq!(check(&long_walk, &world, &config, &mut counters), Verdict::Inconclusive);
        assert_eq!(counters.no_clip, 2);
    }

    #[test]
    fn test_non_finite_positions_are_inconclusive() {
        let world = wall();
        let mut counters = HysteresisCounters { no_clip: 1, ..Default::default() };
        for to in [
            Position::new(f64::NAN, 64.0, 0.5),
            Position::new(f64::INFINITY, 64.0, 0.5),
            Position::new(2.5, f64::NEG_INFINITY, 0.5),
        ] {
            let sample = MoveSample {
                from: Position::new(1.5, 64.0, 0.5),
                to,
                timestamp: 0,
            };
            assert_eq!(
                check(&sample, &world, &NoClipConfig::default(), &mut counters),
                Verdict::Inconclusive
            );
        }
        assert_eq!(counters.no_clip, 1);
    }
}
