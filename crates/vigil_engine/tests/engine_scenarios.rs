//! # Engine Scenario Tests
//!
//! End-to-end behaviour of the detection engine on a manual clock:
//!
//! 1. **Mining trace**: collinear and vertical mining flag, jittered mining does not
//! 2. **Break speed**: per-tool duration overrides decide the verdict
//! 3. **Hysteresis**: counters fire at the threshold and reset on a clean sample
//! 4. **Cooldowns**: batch reports are suppressed until expiry, event reports never are
//! 5. **Bypass**: creative, spectator and permitted entities are never checked
//! 6. **Concurrency**: event-path calls racing batch scans lose nothing
//!
//! Run with: cargo test --test engine_scenarios

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use vigil_core::{
    ActionEvent, BlockPos, BreakEvent, EntityId, Material, Millis, Position, SparseBlockMap, Tool,
    ToolTier,
};
use vigil_engine::{
    ChannelSink, Clock, DetectionCategory, DetectionEngine, DetectionReport, EngineConfig,
    ManualClock, MoveContext,
};

const START: Millis = 1_000_000;
const MINER: EntityId = EntityId(7);
const IRON: Tool = Tool::Pickaxe(ToolTier::Iron);

struct Harness {
    engine: DetectionEngine,
    clock: Arc<ManualClock>,
    reports: Receiver<DetectionReport>,
}

impl Harness {
    fn new(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let (sink, reports) = ChannelSink::unbounded();
        let engine = DetectionEngine::with_clock(config, sink, Arc::clone(&clock) as Arc<dyn Clock>);
        Self { engine, clock, reports }
    }

    /// Records a break at `at`, moving the clock there first.
    fn mine(&self, block: BlockPos, at: Millis) {
        self.clock.set(at);
        self.engine.record_action(
            MINER,
            ActionEvent::Break(BreakEvent::new(block, Material::Stone, IRON, at)),
        );
    }

    fn drain(&self) -> Vec<DetectionReport> {
        self.reports.try_iter().collect()
    }

    fn drain_category(&self, category: DetectionCategory) -> Vec<DetectionReport> {
        self.drain().into_iter().filter(|r| r.category == category).collect()
    }
}

/// Flat grass floor at y = 63 with a stone wall at x = 20.
fn walled_world() -> SparseBlockMap {
    SparseBlockMap::new()
        .with_fill(BlockPos::new(0, 63, -8), BlockPos::new(40, 63, 8), Material::GrassBlock)
        .with_fill(BlockPos::new(20, 64, -4), BlockPos::new(20, 66, 4), Material::Stone)
}

fn mine_collinear(h: &Harness) -> Millis {
    // Eleven breaks on a diagonal, one per second.
    for i in 0..11 {
        h.mine(BlockPos::new(i, 64 - i, i), START + 1_000 * u64::from(i.unsigned_abs()));
    }
    h.clock.now_ms()
}

// ============================================================================
// MINING TRACE
// ============================================================================

#[test]
fn collinear_mining_is_flagged() {
    let h = Harness::new(EngineConfig::default());
    let now = mine_collinear(&h);

    assert_eq!(h.engine.scan_traces(now), 1);

    let reports = h.drain();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.entity, MINER);
    assert_eq!(report.category, DetectionCategory::MiningTrace);
    assert!(report.description.contains("linear"), "{}", report.description);
    assert_eq!(report.location, Some(Position::new(10.0, 54.0, 10.0)));
    assert_eq!(report.timestamp_ms, now);
}

#[test]
fn jittered_mining_is_clean() {
    let h = Harness::new(EngineConfig::default());

    let blocks = [
        (0, 64, 0),
        (3, 62, -2),
        (-1, 65, 4),
        (5, 63, 1),
        (2, 66, -3),
        (-4, 64, 2),
        (1, 61, 5),
        (6, 65, -1),
        (-2, 63, -4),
        (4, 62, 3),
        (0, 66, 1),
    ];
    let gaps = [0, 3_000, 8_000, 4_000, 9_000, 2_500, 7_000, 5_000, 6_500, 3_500, 8_500];

    let mut at = START;
    for ((x, y, z), gap) in blocks.into_iter().zip(gaps) {
        at += gap;
        h.mine(BlockPos::new(x, y, z), at);
    }

    assert_eq!(h.engine.break_count(MINER), 11);
    assert_eq!(h.engine.scan_traces(at), 0);
    assert!(h.drain().is_empty());
}

#[test]
fn vertical_shaft_reports_tunnelling() {
    let h = Harness::new(EngineConfig::default());

    for i in 0..20u64 {
        let y = 60 - 2 * i32::try_from(i).unwrap();
        h.mine(BlockPos::new(3, y, -7), START + 400 * i);
    }
    let now = h.clock.now_ms();
    assert!(now - START < 8_000);

    assert_eq!(h.engine.scan_traces(now), 1);
    let reports = h.drain();
    assert!(
        reports[0].description.contains("vertical tunnelling"),
        "{}",
        reports[0].description
    );
    assert!(reports[0].description.contains("38"));
}

#[test]
fn contiguous_shaft_is_too_shallow_for_tunnelling() {
    let h = Harness::new(EngineConfig::default());

    // Twenty contiguous levels descend 19 blocks, under the 20 block bar,
    // so the shaft is caught by its machine rhythm instead.
    for i in 0..20u64 {
        let y = 60 - i32::try_from(i).unwrap();
        h.mine(BlockPos::new(3, y, -7), START + 400 * i);
    }
    let now = h.clock.now_ms();

    assert_eq!(h.engine.scan_traces(now), 1);
    let reports = h.drain();
    assert!(
        reports[0].description.contains("regular mining rhythm"),
        "{}",
        reports[0].description
    );
    assert!(!reports[0].description.contains("vertical"));
}

#[test]
fn contiguous_shaft_past_twenty_levels_is_tunnelling() {
    let h = Harness::new(EngineConfig::default());

    for i in 0..22u64 {
        let y = 60 - i32::try_from(i).unwrap();
        h.mine(BlockPos::new(3, y, -7), START + 350 * i);
    }
    let now = h.clock.now_ms();

    assert_eq!(h.engine.scan_traces(now), 1);
    let reports = h.drain();
    assert!(
        reports[0].description.contains("vertical tunnelling: descended 21 blocks over 22 breaks"),
        "{}",
        reports[0].description
    );
}

#[test]
fn windowed_evaluation_is_idempotent() {
    let mut config = EngineConfig::default();
    config.trace.cooldown_ms = 0;
    let h = Harness::new(config);
    let now = mine_collinear(&h);

    assert_eq!(h.engine.scan_traces(now), 1);
    assert_eq!(h.engine.scan_traces(now), 1);

    let reports = h.drain();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].description, reports[1].description);
    assert_eq!(reports[0].location, reports[1].location);
}

// ============================================================================
// BREAK SPEED
// ============================================================================

fn override_config(window_ms: Millis) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.break_speed.detection_window_ms = window_ms;
    config
        .break_speed
        .tool_durations
        .insert("iron_pickaxe".to_string(), 1_500);
    config
}

#[test]
fn breaking_faster_than_override_is_flagged() {
    let h = Harness::new(override_config(5_000));

    for i in 0..10u64 {
        h.mine(BlockPos::new(0, 40, i32::try_from(i).unwrap()), START + 200 * i);
    }
    let now = h.clock.now_ms();

    assert_eq!(h.engine.scan_break_speeds(now), 1);
    let reports = h.drain();
    assert_eq!(reports[0].category, DetectionCategory::MiningSpeed);
    assert!(
        reports[0].description.contains("abnormal mining speed"),
        "{}",
        reports[0].description
    );
    assert!(reports[0].description.contains("1500ms"));
}

#[test]
fn breaking_at_override_pace_is_clean() {
    let h = Harness::new(override_config(10_000));

    for i in 0..10u64 {
        h.mine(BlockPos::new(0, 40, i32::try_from(i).unwrap()), START + 1_400 * i);
    }
    let now = h.clock.now_ms();

    assert_eq!(h.engine.scan_break_speeds(now), 0);
    assert!(h.drain().is_empty());
}

// ============================================================================
// HYSTERESIS
// ============================================================================

#[test]
fn no_clip_fires_on_threshold_then_resets() {
    let h = Harness::new(EngineConfig::default());
    let world = walled_world();
    let ctx = MoveContext::new(&world);
    let west = Position::new(19.5, 64.0, 0.5);
    let east = Position::new(21.5, 64.0, 0.5);

    h.engine.on_move(MINER, west, east, &ctx);
    h.engine.on_move(MINER, east, west, &ctx);
    assert!(h.drain_category(DetectionCategory::NoClip).is_empty());
    assert_eq!(h.engine.counters(MINER).unwrap().no_clip, 2);

    h.engine.on_move(MINER, west, east, &ctx);
    let reports = h.drain_category(DetectionCategory::NoClip);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].location, Some(Position::new(20.0, 64.0, 0.0)));
    assert!(reports[0].description.contains("3 consecutive"));

    // Walking on through open air clears the streak.
    h.engine
        .on_move(MINER, east, Position::new(22.5, 64.0, 0.5), &ctx);
    assert_eq!(h.engine.counters(MINER).unwrap().no_clip, 0);
    assert!(h.drain_category(DetectionCategory::NoClip).is_empty());
}

#[test]
fn ground_speed_counter_resets_on_compliant_sample() {
    let h = Harness::new(EngineConfig::default());
    let world = walled_world();
    let ctx = MoveContext::new(&world);

    h.engine
        .on_move(MINER, Position::new(1.5, 64.0, 0.5), Position::new(2.5, 64.0, 0.5), &ctx);
    h.engine
        .on_move(MINER, Position::new(2.5, 64.0, 0.5), Position::new(3.5, 64.0, 0.5), &ctx);
    assert_eq!(h.engine.counters(MINER).unwrap().ground_speed, 2);

    h.engine
        .on_move(MINER, Position::new(3.5, 64.0, 0.5), Position::new(3.6, 64.0, 0.5), &ctx);
    assert_eq!(h.engine.counters(MINER).unwrap().ground_speed, 0);

    // Two more fast samples are not enough to fire again.
    h.engine
        .on_move(MINER, Position::new(3.6, 64.0, 0.5), Position::new(4.6, 64.0, 0.5), &ctx);
    h.engine
        .on_move(MINER, Position::new(4.6, 64.0, 0.5), Position::new(5.6, 64.0, 0.5), &ctx);
    assert!(h.drain_category(DetectionCategory::GroundSpeed).is_empty());
}

// ============================================================================
// COOLDOWNS
// ============================================================================

#[test]
fn batch_reports_are_suppressed_until_cooldown_expires() {
    let h = Harness::new(EngineConfig::default());
    let now = mine_collinear(&h);

    assert_eq!(h.engine.scan_traces(now), 1);
    assert!(h.engine.in_cooldown(MINER, DetectionCategory::MiningTrace));
    assert_eq!(h.engine.stats().trace_cooldowns, 1);

    // Still inside the 2 s cooldown.
    assert_eq!(h.engine.scan_traces(now + 1_000), 0);
    assert_eq!(h.engine.scan_traces(now + 1_999), 0);

    // Expired.
    h.clock.set(now + 2_000);
    assert!(!h.engine.in_cooldown(MINER, DetectionCategory::MiningTrace));
    assert_eq!(h.engine.scan_traces(now + 2_000), 1);

    assert_eq!(h.drain().len(), 2);
}

#[test]
fn break_speed_reports_are_suppressed_until_cooldown_expires() {
    let h = Harness::new(override_config(30_000));

    for i in 0..10u64 {
        h.mine(BlockPos::new(0, 40, i32::try_from(i).unwrap()), START + 200 * i);
    }
    let now = h.clock.now_ms();

    assert_eq!(h.engine.scan_break_speeds(now), 1);
    assert!(h.engine.in_cooldown(MINER, DetectionCategory::MiningSpeed));
    assert_eq!(h.engine.stats().break_speed_cooldowns, 1);
    assert!(!h.engine.in_cooldown(MINER, DetectionCategory::MiningTrace));

    // Same evidence, still inside the 10 s cooldown.
    assert_eq!(h.engine.scan_break_speeds(now + 5_000), 0);
    assert_eq!(h.engine.scan_break_speeds(now + 9_999), 0);

    h.clock.set(now + 10_000);
    assert!(!h.engine.in_cooldown(MINER, DetectionCategory::MiningSpeed));
    assert_eq!(h.engine.scan_break_speeds(now + 10_000), 1);

    let reports = h.drain();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.category == DetectionCategory::MiningSpeed));
}

#[test]
fn event_path_ignores_batch_cooldowns() {
    let h = Harness::new(EngineConfig::default());
    let now = mine_collinear(&h);
    assert_eq!(h.engine.scan_traces(now), 1);
    assert!(h.engine.in_cooldown(MINER, DetectionCategory::MiningTrace));
    h.drain();

    let world = walled_world();
    let ctx = MoveContext::new(&world);
    let west = Position::new(19.5, 64.0, 0.5);
    let east = Position::new(21.5, 64.0, 0.5);
    for i in 0..5 {
        let (from, to) = if i % 2 == 0 { (west, east) } else { (east, west) };
        h.engine.on_move(MINER, from, to, &ctx);
    }

    // Every violating move from the third onward reports.
    let reports = h.drain_category(DetectionCategory::NoClip);
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|r| r.violation_total).collect::<Vec<_>>(),
        // Trace report was 1; ground speed fires alongside each no-clip.
        vec![3, 5, 7]
    );
}

// ============================================================================
// BYPASS
// ============================================================================

#[test]
fn bypassing_flyer_is_never_reported() {
    let h = Harness::new(EngineConfig::default());
    let world = walled_world();
    let flying = MoveContext::new(&world).with_flight(true, true);

    let mut from = Position::new(1.5, 90.0, 0.5);
    for _ in 0..5 {
        let to = Position::new(from.x + 1.0, 90.0, 0.5);
        h.engine.on_move(MINER, from, to, &flying.bypassing(true));
        from = to;
    }
    assert!(h.drain().is_empty());
    assert!(h.engine.counters(MINER).is_none());

    // The same flight without bypass is a ground speed violation.
    for _ in 0..5 {
        let to = Position::new(from.x + 1.0, 90.0, 0.5);
        h.engine.on_move(MINER, from, to, &flying);
        from = to;
    }
    assert_eq!(h.drain_category(DetectionCategory::GroundSpeed).len(), 3);
}

#[test]
fn spectator_passes_through_walls_unreported() {
    let h = Harness::new(EngineConfig::default());
    let world = walled_world();
    let spectator = MoveContext::new(&world).bypassing(true);
    let west = Position::new(19.5, 64.0, 0.5);
    let east = Position::new(21.5, 64.0, 0.5);

    for i in 0..6 {
        let (from, to) = if i % 2 == 0 { (west, east) } else { (east, west) };
        h.engine.on_move(MINER, from, to, &spectator);
    }
    assert!(h.drain().is_empty());
}

#[test]
fn bypass_set_covers_batch_scans() {
    let h = Harness::new(EngineConfig::default());
    let now = mine_collinear(&h);

    h.engine.set_bypass(MINER, true);
    assert_eq!(h.engine.scan_traces(now), 0);

    h.engine.set_bypass(MINER, false);
    assert_eq!(h.engine.scan_traces(now), 1);
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn event_path_races_batch_scans_without_loss() {
    const ENTITIES: u64 = 8;
    const WRITERS: u64 = 4;
    const BREAKS: u64 = 100;

    let h = Harness::new(EngineConfig::default());
    let world = walled_world();
    let engine = &h.engine;

    thread::scope(|scope| {
        for writer in 0..WRITERS {
            let world = &world;
            scope.spawn(move || {
                let ctx = MoveContext::new(world);
                for n in 0..BREAKS {
                    for raw in 1..=ENTITIES {
                        let id = EntityId(raw);
                        let z = i32::try_from(writer * BREAKS + n).unwrap();
                        engine.record_action(
                            id,
                            ActionEvent::Break(BreakEvent::new(
                                BlockPos::new(1, 50, z),
                                Material::Stone,
                                IRON,
                                START,
                            )),
                        );
                        engine.on_move(
                            id,
                            Position::new(5.5, 64.0, 0.5),
                            Position::new(5.6, 64.0, 0.5),
                            &ctx,
                        );
                    }
                }
            });
        }
        for _ in 0..2 {
            scope.spawn(move || {
                for _ in 0..200 {
                    engine.run_batch_scan();
                }
            });
        }
    });

    // Time is frozen, so every cooldown is still live and a final scan only
    // reports entities the racing scans never flagged.
    engine.run_batch_scan();

    for raw in 1..=ENTITIES {
        assert_eq!(engine.break_count(EntityId(raw)), usize::try_from(WRITERS * BREAKS).unwrap());
    }

    let mut per_entity: HashMap<(EntityId, DetectionCategory), usize> = HashMap::new();
    for report in h.drain() {
        *per_entity.entry((report.entity, report.category)).or_default() += 1;
    }
    for raw in 1..=ENTITIES {
        assert_eq!(per_entity.get(&(EntityId(raw), DetectionCategory::MiningTrace)), Some(&1));
        assert_eq!(per_entity.get(&(EntityId(raw), DetectionCategory::MiningSpeed)), None);
    }
    assert_eq!(per_entity.len(), usize::try_from(ENTITIES).unwrap());
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn reload_drops_history_and_cooldowns() {
    let h = Harness::new(EngineConfig::default());
    let now = mine_collinear(&h);
    assert_eq!(h.engine.scan_traces(now), 1);

    h.engine
        .reload_from_toml("[trace]\nsensitivity = 9\n")
        .unwrap();

    assert_eq!(h.engine.config().trace.sensitivity, 9);
    assert_eq!(h.engine.break_count(MINER), 0);
    assert!(!h.engine.in_cooldown(MINER, DetectionCategory::MiningTrace));
    assert_eq!(h.engine.stats().tracked_entities, 0);
}

#[test]
fn exempt_entities_are_never_recorded() {
    let mut config = EngineConfig::default();
    config.exemptions.entities.push(MINER);
    let h = Harness::new(config);
    let now = mine_collinear(&h);

    assert_eq!(h.engine.break_count(MINER), 0);
    assert_eq!(h.engine.scan_traces(now), 0);
    assert!(h.drain().is_empty());
}
