//! # Detection Engine
//!
//! The entry point hosts talk to. Two execution paths share one entity
//! store:
//!
//! ```text
//! EVENT PATH (caller's thread)           BATCH PATH (scheduler thread)
//!     │                                      │
//!     │ on_move / on_interact / ...          │ run_batch_scan
//!     ▼                                      ▼
//! record ──► detector ──► sink         snapshot ids ──► cooldown? ──► detector
//!                                                                   │
//!                                                      sink ◄───────┤
//!                                                  start cooldown ◄─┘
//! ```
//!
//! Event-path reports are never cooldown-gated. Configuration is an
//! immutable snapshot swapped atomically on reload; every call works on the
//! snapshot it loaded at entry.
//!
//! Entities outside the rules (creative or spectator mode, a bypass
//! permission) are either flagged per move through
//! [`MoveContext::bypass`] or held in the bypass set via
//! [`DetectionEngine::set_bypass`]. Neither is recorded nor checked.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::RwLock;
use vigil_core::{
    ActionEvent, BreakEvent, ClickSample, DamageSample, EntityId, Millis, MoveSample, Position,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::cooldown::CooldownSet;
use crate::detectors::{
    break_speed, click_rate, damage, flight, ground_speed, no_clip, trace, MoveContext, Verdict,
};
use crate::error::EngineResult;
use crate::report::{DetectionCategory, DetectionReport, Enforcement, ReportSink};
use crate::store::{EntityRecord, EntityStore, HysteresisCounters};

/// Kinds of interaction the host reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractKind {
    /// Left click at nothing.
    LeftClickAir,
    /// Left click on a block.
    LeftClickBlock,
    /// Right click at nothing.
    RightClickAir,
    /// Right click on a block.
    RightClickBlock,
    /// Stepping on a pressure plate or similar.
    Physical,
}

impl InteractKind {
    /// Returns true for the kinds the click-rate check counts.
    #[inline]
    #[must_use]
    pub const fn is_left_click(self) -> bool {
        matches!(self, Self::LeftClickAir | Self::LeftClickBlock)
    }
}

/// Point-in-time engine counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Entities with history or counters.
    pub tracked_entities: usize,
    /// Entities currently suppressed by the trace cooldown.
    pub trace_cooldowns: usize,
    /// Entities currently suppressed by the break-speed cooldown.
    pub break_speed_cooldowns: usize,
    /// Reports delivered since start.
    pub reports_emitted: u64,
}

/// A report waiting to be delivered once the entity lock is released.
type Pending = Vec<DetectionReport>;

/// The behavioural anomaly detection engine.
pub struct DetectionEngine {
    /// Current configuration snapshot.
    config: RwLock<Arc<EngineConfig>>,
    /// Per-entity state.
    store: EntityStore,
    /// Batch-path suppression.
    cooldowns: CooldownSet,
    /// Entities currently exempt by game mode or permission.
    bypassed: DashSet<EntityId>,
    /// Report destination.
    sink: Box<dyn ReportSink>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Reports delivered.
    reports_emitted: AtomicU64,
    /// Set by `shutdown`.
    stopped: AtomicBool,
}

impl DetectionEngine {
    /// Creates an engine on the system clock.
    pub fn new(config: EngineConfig, sink: impl ReportSink + 'static) -> Self {
        Self::with_clock(config, sink, Arc::new(SystemClock))
    }

    /// Creates an engine on the given clock.
    pub fn with_clock(
        config: EngineConfig,
        sink: impl ReportSink + 'static,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = config.validated();
        tracing::info!(
            enabled = config.general.enabled,
            interval_ms = config.general.check_interval_ms,
            exempt = config.exemptions.entities.len(),
            "detection engine started"
        );
        Self {
            config: RwLock::new(Arc::new(config)),
            store: EntityStore::new(),
            cooldowns: CooldownSet::new(),
            bypassed: DashSet::new(),
            sink: Box::new(sink),
            clock,
            reports_emitted: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns the active configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<EngineConfig> {
        Arc::clone(&self.config.read())
    }

    /// Returns the engine's clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Returns true once `shutdown` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Returns the snapshot if `entity` should be observed at all.
    fn admit(&self, entity: EntityId) -> Option<Arc<EngineConfig>> {
        if self.is_stopped() {
            return None;
        }
        if self.bypassed.contains(&entity) {
            return None;
        }
        let config = self.config();
        if !config.general.enabled || config.exemptions.contains(entity) {
            return None;
        }
        Some(config)
    }

    /// Puts an entity in or out of the bypass set. The host calls this when
    /// the entity's game mode or bypass permission changes.
    ///
    /// Entering bypass drops the entity's running violation streaks, so a
    /// streak never straddles a period nobody was watching.
    pub fn set_bypass(&self, entity: EntityId, bypass: bool) {
        if self.is_stopped() {
            return;
        }
        if bypass {
            if self.bypassed.insert(entity) {
                if let Some(handle) = self.store.get(entity) {
                    let mut record = handle.lock();
                    let total = record.counters.total;
                    record.counters = HysteresisCounters {
                        total,
                        ..HysteresisCounters::default()
                    };
                }
                tracing::debug!(%entity, "bypass on");
            }
        } else if self.bypassed.remove(&entity).is_some() {
            tracing::debug!(%entity, "bypass off");
        }
    }

    /// Returns true if the entity is in the bypass set.
    #[must_use]
    pub fn is_bypassed(&self, entity: EntityId) -> bool {
        self.bypassed.contains(&entity)
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Appends a raw action to the entity's history without running any
    /// event-path check. Breaks made without a mining tool are dropped.
    pub fn record_action(&self, entity: EntityId, event: ActionEvent) {
        let Some(config) = self.admit(entity) else {
            return;
        };
        let now = self.clock.now_ms();

        match event {
            ActionEvent::Break(event) => self.record_break(&config, entity, event, now),
            ActionEvent::Move(sample) => {
                self.store
                    .with(entity, |r| r.history.last_position = Some(sample.to));
            }
            ActionEvent::Click(click) => self.store.with(entity, |r| {
                r.history.clicks.record(click);
                r.history.clicks.prune(config.auto_click.window_ms, now);
            }),
            ActionEvent::Damage(hit) => self.store.with(entity, |r| {
                r.history.damage.record(hit);
                r.history.damage.prune(config.god_mode.window_ms, now);
            }),
        }
    }

    fn record_break(&self, config: &EngineConfig, entity: EntityId, event: BreakEvent, now: Millis) {
        if !event.tool.is_mining_tool() {
            tracing::trace!(%entity, tool = %event.tool, "ignoring break without mining tool");
            return;
        }
        let retention = config.break_retention_ms();
        self.store.with(entity, |r| {
            r.history.breaks.record(event);
            r.history.breaks.prune(retention, now);
        });
    }

    // =========================================================================
    // Event path
    // =========================================================================

    /// Handles a move and runs the flight, ground-speed and no-clip checks.
    pub fn on_move(&self, entity: EntityId, from: Position, to: Position, ctx: &MoveContext<'_>) {
        if ctx.bypass {
            return;
        }
        let Some(config) = self.admit(entity) else {
            return;
        };
        let now = self.clock.now_ms();
        let sample = MoveSample {
            from,
            to,
            timestamp: now,
        };

        let pending = self.store.with(entity, |record| {
            record.history.last_position = Some(to);
            let mut pending = Pending::new();

            if config.flight.enabled {
                if let Verdict::Flagged(finding) =
                    flight::check_move(&sample, ctx, &config.flight, &mut record.counters)
                {
                    pending.push(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::Flight,
                        finding.to_string(),
                        Some(to),
                        now,
                    ));
                }
            }

            if config.ground_speed.enabled {
                if let Verdict::Flagged(finding) =
                    ground_speed::check(&sample, ctx, &config.ground_speed, &mut record.counters)
                {
                    pending.push(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::GroundSpeed,
                        finding.to_string(),
                        Some(to),
                        now,
                    ));
                }
            }

            if config.no_clip.enabled {
                if let Verdict::Flagged(finding) =
                    no_clip::check(&sample, ctx.world, &config.no_clip, &mut record.counters)
                {
                    pending.push(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::NoClip,
                        finding.to_string(),
                        Some(finding.block.to_position()),
                        now,
                    ));
                }
            }

            if config.general.debug {
                debug_counters(entity, &record.counters);
            }
            pending
        });

        self.deliver_all(pending);
    }

    /// Handles an interaction. Only left clicks are logged and rate-checked.
    pub fn on_interact(&self, entity: EntityId, kind: InteractKind) {
        if !kind.is_left_click() {
            return;
        }
        let Some(config) = self.admit(entity) else {
            return;
        };
        if !config.auto_click.enabled {
            return;
        }
        let now = self.clock.now_ms();
        let window = config.auto_click.window_ms;

        let pending = self.store.with(entity, |record| {
            record.history.clicks.record(ClickSample { timestamp: now });
            record.history.clicks.prune(window, now);
            let count = record.history.clicks.count_window(window, now);

            match click_rate::check(count, &config.auto_click, &mut record.counters) {
                Verdict::Flagged(finding) => {
                    let location = record.history.last_position;
                    Some(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::AutoClick,
                        finding.to_string(),
                        location,
                        now,
                    ))
                }
                _ => None,
            }
        });

        if let Some(report) = pending {
            self.deliver(report);
        }
    }

    /// Handles final damage applied to the entity.
    pub fn on_damage(&self, entity: EntityId, amount: f64, max_health: f64) {
        let Some(config) = self.admit(entity) else {
            return;
        };
        if !config.god_mode.enabled {
            return;
        }
        let now = self.clock.now_ms();
        let window = config.god_mode.window_ms;

        let pending = self.store.with(entity, |record| {
            record.history.damage.record(DamageSample {
                timestamp: now,
                amount,
            });
            record.history.damage.prune(window, now);
            let total: f64 = record
                .history
                .damage
                .iter_window(window, now)
                .map(|d| d.amount)
                .sum();

            match damage::check(total, max_health, &config.god_mode) {
                Verdict::Flagged(finding) => {
                    let location = record.history.last_position;
                    Some(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::GodMode,
                        finding.to_string(),
                        location,
                        now,
                    ))
                }
                _ => None,
            }
        });

        if let Some(report) = pending {
            self.deliver(report);
        }
    }

    /// Handles the entity dying: its damage log starts over.
    pub fn on_death(&self, entity: EntityId) {
        if self.is_stopped() {
            return;
        }
        if let Some(handle) = self.store.get(entity) {
            handle.lock().history.damage.clear();
        }
    }

    /// Handles the entity switching flight on or off.
    pub fn on_flight_toggle(&self, entity: EntityId, now_flying: bool, has_permission: bool) {
        let Some(config) = self.admit(entity) else {
            return;
        };
        if !config.flight.enabled {
            return;
        }
        let now = self.clock.now_ms();

        let pending = self.store.with(entity, |record| {
            match flight::check_toggle(now_flying, has_permission, &mut record.counters) {
                Verdict::Flagged(finding) => {
                    let location = record.history.last_position;
                    Some(self.build_report(
                        &config,
                        entity,
                        record,
                        DetectionCategory::FlightToggle,
                        finding.to_string(),
                        location,
                        now,
                    ))
                }
                _ => None,
            }
        });

        if let Some(report) = pending {
            self.deliver(report);
        }
    }

    /// Forgets everything about an entity that left.
    pub fn on_entity_disconnect(&self, entity: EntityId) {
        let removed = self.store.remove(entity);
        self.cooldowns.remove_entity(entity);
        self.bypassed.remove(&entity);
        if removed {
            tracing::debug!(%entity, "entity evicted");
        }
    }

    // =========================================================================
    // Batch path
    // =========================================================================

    /// Runs the trace scan and then the break-speed scan at the current
    /// time. Returns the number of reports delivered.
    pub fn run_batch_scan(&self) -> usize {
        if self.is_stopped() {
            return 0;
        }
        let now = self.clock.now_ms();
        self.scan_traces(now) + self.scan_break_speeds(now)
    }

    /// Runs the trace detector over every tracked entity.
    pub fn scan_traces(&self, now: Millis) -> usize {
        let config = self.config();
        if !config.general.enabled || !config.trace.enabled {
            return 0;
        }
        self.scan(&config, DetectionCategory::MiningTrace, config.trace.cooldown_ms, now, |record| {
            let events = record.history.breaks.windowed(config.trace.window_ms, now);
            let location = events.last().map(|e| e.location.to_position());
            trace::evaluate(&events, &config.trace)
                .flagged()
                .map(|finding| (finding.to_string(), location))
        })
    }

    /// Runs the break-speed detector over every tracked entity.
    pub fn scan_break_speeds(&self, now: Millis) -> usize {
        let config = self.config();
        if !config.general.enabled || !config.break_speed.enabled {
            return 0;
        }
        self.scan(
            &config,
            DetectionCategory::MiningSpeed,
            config.break_speed.cooldown_ms,
            now,
            |record| {
                let events = record
                    .history
                    .breaks
                    .windowed(config.break_speed.detection_window_ms, now);
                let location = events.last().map(|e| e.location.to_position());
                break_speed::evaluate(&events, &config.break_speed)
                    .flagged()
                    .map(|finding| (finding.to_string(), location))
            },
        )
    }

    fn scan(
        &self,
        config: &EngineConfig,
        category: DetectionCategory,
        cooldown_ms: Millis,
        now: Millis,
        detect: impl Fn(&EntityRecord) -> Option<(String, Option<Position>)>,
    ) -> usize {
        let mut delivered = 0;
        for (entity, handle) in self.store.snapshot() {
            if config.exemptions.contains(entity) || self.bypassed.contains(&entity) {
                continue;
            }

            // Cooldown check and start both happen under the entity lock so
            // concurrent scans report an entity at most once per cooldown.
            let report = {
                let mut guard = handle.lock();
                if self.cooldowns.is_active(entity, category, now) {
                    continue;
                }
                let record = &mut *guard;
                detect(record).map(|(description, location)| {
                    self.cooldowns.start(entity, category, cooldown_ms, now);
                    self.build_report(config, entity, record, category, description, location, now)
                })
            };

            if let Some(report) = report {
                self.deliver(report);
                delivered += 1;
            }
        }
        delivered
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Installs a new configuration and drops all per-entity state.
    pub fn reload(&self, config: EngineConfig) {
        let config = Arc::new(config.validated());
        *self.config.write() = config;
        self.store.clear();
        self.cooldowns.clear();
        tracing::info!("configuration reloaded");
    }

    /// Parses a TOML document and installs it. On failure the previous
    /// configuration and all state stay as they were.
    ///
    /// # Errors
    ///
    /// Returns the parse or validation error.
    pub fn reload_from_toml(&self, source: &str) -> EngineResult<()> {
        match EngineConfig::from_toml_str(source) {
            Ok(config) => {
                self.reload(config);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "reload rejected, keeping previous configuration");
                Err(err.into())
            }
        }
    }

    /// Stops the engine and drops all state. Later calls are ignored.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.store.clear();
        self.cooldowns.clear();
        self.bypassed.clear();
        tracing::info!(
            reports = self.reports_emitted.load(Ordering::Relaxed),
            "detection engine stopped"
        );
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns engine counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let now = self.clock.now_ms();
        EngineStats {
            tracked_entities: self.store.len(),
            trace_cooldowns: self.cooldowns.live_count(DetectionCategory::MiningTrace, now),
            break_speed_cooldowns: self.cooldowns.live_count(DetectionCategory::MiningSpeed, now),
            reports_emitted: self.reports_emitted.load(Ordering::Relaxed),
        }
    }

    /// Returns a copy of an entity's hysteresis counters.
    #[must_use]
    pub fn counters(&self, entity: EntityId) -> Option<HysteresisCounters> {
        self.store.get(entity).map(|h| h.lock().counters)
    }

    /// Returns how many breaks are retained for an entity.
    #[must_use]
    pub fn break_count(&self, entity: EntityId) -> usize {
        self.store
            .get(entity)
            .map_or(0, |h| h.lock().history.breaks.len())
    }

    /// Returns true if the entity is suppressed in a batch category.
    #[must_use]
    pub fn in_cooldown(&self, entity: EntityId, category: DetectionCategory) -> bool {
        self.cooldowns
            .is_active(entity, category, self.clock.now_ms())
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    fn build_report(
        &self,
        config: &EngineConfig,
        entity: EntityId,
        record: &mut EntityRecord,
        category: DetectionCategory,
        description: String,
        location: Option<Position>,
        now: Millis,
    ) -> DetectionReport {
        let total = HysteresisCounters::bump(&mut record.counters.total);
        let escalation = &config.escalation;
        let enforcement = if escalation.enabled && total >= escalation.warning_count {
            record.counters.total = 0;
            Some(Enforcement {
                action: escalation.action,
                message: escalation.message.clone(),
            })
        } else {
            None
        };

        if config.general.debug {
            tracing::debug!(%entity, %category, total, "{description}");
        }

        DetectionReport {
            entity,
            category,
            description,
            location,
            timestamp_ms: now,
            violation_total: total,
            enforcement,
        }
    }

    fn deliver(&self, report: DetectionReport) {
        self.reports_emitted.fetch_add(1, Ordering::Relaxed);
        self.sink.notify(report);
    }

    fn deliver_all(&self, reports: Pending) {
        for report in reports {
            self.deliver(report);
        }
    }
}

impl std::fmt::Debug for DetectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionEngine")
            .field("stats", &self.stats())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

fn debug_counters(entity: EntityId, counters: &HysteresisCounters) {
    tracing::debug!(
        %entity,
        flight = counters.flight,
        hover = counters.hover,
        ground_speed = counters.ground_speed,
        no_clip = counters.no_clip,
        "movement counters"
    );
}
