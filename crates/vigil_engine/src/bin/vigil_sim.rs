//! # VIGIL Simulator
//!
//! Drives a handful of synthetic entities through the detection engine on a
//! manual clock and prints what was caught.
//!
//! ```text
//! vigil_sim [--seconds N] [--seed S] [--config vigil.toml]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vigil_core::{
    ActionEvent, BlockPos, BreakEvent, EntityId, Material, Position, SparseBlockMap, Tool, ToolTier,
};
use vigil_engine::{
    ChannelSink, Clock, DetectionCategory, DetectionEngine, EngineConfig, FanoutSink, InteractKind,
    ManualClock, MoveContext, TracingSink,
};

/// Simulation step.
const TICK_MS: u64 = 50;

/// One synthetic actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Script {
    HonestMiner,
    HonestWalker,
    LineMiner,
    ShaftDigger,
    SpeedMiner,
    Flyer,
    Clicker,
    Phaser,
}

impl Script {
    const ALL: [Self; 8] = [
        Self::HonestMiner,
        Self::HonestWalker,
        Self::LineMiner,
        Self::ShaftDigger,
        Self::SpeedMiner,
        Self::Flyer,
        Self::Clicker,
        Self::Phaser,
    ];

    const fn name(self) -> &'static str {
        match self {
            Self::HonestMiner => "honest miner",
            Self::HonestWalker => "honest walker",
            Self::LineMiner => "line miner",
            Self::ShaftDigger => "shaft digger",
            Self::SpeedMiner => "speed miner",
            Self::Flyer => "flyer",
            Self::Clicker => "auto clicker",
            Self::Phaser => "phaser",
        }
    }

    const fn is_scripted(self) -> bool {
        !matches!(self, Self::HonestMiner | Self::HonestWalker)
    }
}

/// Mutable per-actor simulation state.
struct Actor {
    id: EntityId,
    script: Script,
    position: Position,
    next_action_ms: u64,
    step: i32,
}

struct Args {
    seconds: u64,
    seed: u64,
    config: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    Args {
        seconds: value("--seconds").and_then(|s| s.parse().ok()).unwrap_or(120),
        seed: value("--seed").and_then(|s| s.parse().ok()).unwrap_or(0x5EED),
        config: value("--config"),
    }
}

fn build_world() -> SparseBlockMap {
    SparseBlockMap::new()
        // Ground
        .with_fill(BlockPos::new(-64, 63, -64), BlockPos::new(64, 63, 64), Material::GrassBlock)
        // A wall the phaser walks through
        .with_fill(BlockPos::new(20, 64, -4), BlockPos::new(20, 67, 4), Material::Stone)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VIGIL SIMULATOR                                          ║");
    println!("║         THE WATCHER                                              ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args = parse_args();

    let config = match &args.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                println!("Error: could not load {path}: {e}");
                return;
            }
        },
        None => EngineConfig::default(),
    };

    println!("Seed:      {:#x}", args.seed);
    println!("Duration:  {} s simulated", args.seconds);
    println!("Actors:    {}", Script::ALL.len());
    println!();

    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let (channel, rx) = ChannelSink::unbounded();
    let sink = FanoutSink::new().with(TracingSink).with(channel);
    let engine = DetectionEngine::with_clock(config, sink, Arc::clone(&clock) as Arc<dyn Clock>);
    let world = build_world();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let start = clock.now_ms();
    let mut actors: Vec<Actor> = Script::ALL
        .iter()
        .zip(1u64..)
        .map(|(&script, raw)| Actor {
            id: EntityId(raw),
            script,
            position: Position::new(f64::from(i32::try_from(raw).unwrap_or(0)) * 4.0, 64.0, -20.0),
            next_action_ms: start,
            step: 0,
        })
        .collect();

    let interval = engine.config().general.check_interval_ms;
    let mut next_scan = start + interval;
    let end = start + args.seconds * 1000;

    while clock.now_ms() < end {
        let now = clock.advance(TICK_MS);
        for actor in &mut actors {
            if now >= actor.next_action_ms {
                act(&engine, &world, actor, now, &mut rng);
            }
        }
        if now >= next_scan {
            engine.run_batch_scan();
            next_scan += interval;
        }
    }

    let mut caught: BTreeMap<u64, BTreeMap<DetectionCategory, usize>> = BTreeMap::new();
    for report in rx.try_iter() {
        *caught
            .entry(report.entity.raw())
            .or_default()
            .entry(report.category)
            .or_default() += 1;
    }

    println!();
    println!("┌─ DETECTIONS ─────────────────────────────────────────────────────┐");
    for actor in &actors {
        let kind = if actor.script.is_scripted() { "scripted" } else { "honest" };
        match caught.get(&actor.id.raw()) {
            Some(categories) => {
                let summary: Vec<String> = categories
                    .iter()
                    .map(|(category, count)| format!("{category} x{count}"))
                    .collect();
                println!("│ {:<14} {:<9} {}", actor.script.name(), kind, summary.join(", "));
            }
            None => println!("│ {:<14} {:<9} -", actor.script.name(), kind),
        }
    }
    println!("└──────────────────────────────────────────────────────────────────┘");

    let stats = engine.stats();
    println!();
    println!("Reports emitted:   {}", stats.reports_emitted);
    println!("Tracked entities:  {}", stats.tracked_entities);

    let missed: Vec<&str> = actors
        .iter()
        .filter(|a| a.script.is_scripted() && !caught.contains_key(&a.id.raw()))
        .map(|a| a.script.name())
        .collect();
    let false_positives: Vec<&str> = actors
        .iter()
        .filter(|a| !a.script.is_scripted() && caught.contains_key(&a.id.raw()))
        .map(|a| a.script.name())
        .collect();
    println!("Missed:            {}", if missed.is_empty() { "none".to_string() } else { missed.join(", ") });
    println!(
        "False positives:   {}",
        if false_positives.is_empty() { "none".to_string() } else { false_positives.join(", ") }
    );

    engine.shutdown();
}

fn act(engine: &DetectionEngine, world: &SparseBlockMap, actor: &mut Actor, now: u64, rng: &mut ChaCha8Rng) {
    let ctx = MoveContext::new(world);
    let base = actor.position.block();
    actor.step += 1;

    match actor.script {
        Script::HonestMiner => {
            // Wander a small room, irregular pace, mixed blocks.
            let target = BlockPos::new(
                base.x + rng.gen_range(-3..=3),
                base.y + rng.gen_range(-2..=2),
                base.z + rng.gen_range(-3..=3),
            );
            let material = if rng.gen_bool(0.1) { Material::CoalOre } else { Material::Stone };
            mine(engine, actor.id, target, material, Tool::Pickaxe(ToolTier::Iron), now);
            actor.next_action_ms = now + rng.gen_range(1_300..4_500);
        }
        Script::HonestWalker => {
            let dx = rng.gen_range(-0.2..0.2);
            let dz = rng.gen_range(-0.2..0.2);
            let to = Position::new(actor.position.x + dx, 64.0, actor.position.z + dz);
            engine.on_move(actor.id, actor.position, to, &ctx.sprinting(rng.gen_bool(0.3)));
            actor.position = to;
            actor.next_action_ms = now + TICK_MS;
        }
        Script::LineMiner => {
            // Diagonal staircase towards a known ore vein.
            let target = BlockPos::new(base.x + actor.step, base.y - actor.step, base.z + actor.step);
            mine(engine, actor.id, target, Material::Stone, Tool::Pickaxe(ToolTier::Diamond), now);
            actor.next_action_ms = now + rng.gen_range(900..2_600);
        }
        Script::ShaftDigger => {
            let target = BlockPos::new(base.x, 60 - 2 * actor.step, base.z);
            mine(engine, actor.id, target, Material::Deepslate, Tool::Pickaxe(ToolTier::Netherite), now);
            actor.next_action_ms = now + rng.gen_range(300..500);
        }
        Script::SpeedMiner => {
            let target = BlockPos::new(base.x + rng.gen_range(-2..=2), 30, base.z + rng.gen_range(-2..=2));
            mine(engine, actor.id, target, Material::DiamondOre, Tool::Pickaxe(ToolTier::Diamond), now);
            actor.next_action_ms = now + rng.gen_range(250..400);
        }
        Script::Flyer => {
            let to = Position::new(actor.position.x, actor.position.y + 0.9, actor.position.z);
            engine.on_move(actor.id, actor.position, to, &ctx);
            actor.position = to;
            actor.next_action_ms = now + TICK_MS;
        }
        Script::Clicker => {
            // Two to three clicks per tick is 40-60 cps.
            for _ in 0..rng.gen_range(2..=3) {
                engine.on_interact(actor.id, InteractKind::LeftClickAir);
            }
            actor.next_action_ms = now + TICK_MS;
        }
        Script::Phaser => {
            let from = Position::new(19.5, 64.0, 0.5);
            let to = Position::new(21.5, 64.0, 0.5);
            let (from, to) = if actor.step % 2 == 0 { (to, from) } else { (from, to) };
            engine.on_move(actor.id, from, to, &ctx);
            actor.position = to;
            actor.next_action_ms = now + 200;
        }
    }
}

fn mine(engine: &DetectionEngine, id: EntityId, at: BlockPos, material: Material, tool: Tool, now: u64) {
    engine.record_action(id, ActionEvent::Break(BreakEvent::new(at, material, tool, now)));
}
