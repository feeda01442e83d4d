//! # Entity Store
//!
//! Per-entity history and hysteresis counters.
//!
//! ## Locking
//!
//! ```text
//! DashMap shard lock ──► lookup/insert Arc only
//!                            │
//!                            ▼
//!                 Arc<Mutex<EntityRecord>> ──► detector work
//! ```
//!
//! Different entities never contend on the same mutex, and a batch scan
//! holds no shard lock while it runs detectors.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use vigil_core::EntityId;

use crate::history::EntityHistory;

/// Consecutive-violation counters for one entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HysteresisCounters {
    /// Flight speed and toggle violations.
    pub flight: u32,
    /// Consecutive airborne level samples.
    pub hover: u32,
    /// Ground speed violations.
    pub ground_speed: u32,
    /// Solid-block intersections.
    pub no_clip: u32,
    /// Click-rate violations.
    pub auto_click: u32,
    /// Reports since the last escalation.
    pub total: u32,
}

impl HysteresisCounters {
    /// Increments a counter and returns the new value.
    #[inline]
    pub fn bump(counter: &mut u32) -> u32 {
        *counter = counter.saturating_add(1);
        *counter
    }
}

/// Everything the engine keeps for one entity.
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    /// Logged actions.
    pub history: EntityHistory,
    /// Hysteresis counters.
    pub counters: HysteresisCounters,
}

/// Shared handle to one entity's record.
pub type EntityHandle = Arc<Mutex<EntityRecord>>;

/// Concurrent map of tracked entities.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: DashMap<EntityId, EntityHandle>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for an entity, creating it on first sight.
    #[must_use]
    pub fn entry(&self, id: EntityId) -> EntityHandle {
        Arc::clone(self.entities.entry(id).or_default().value())
    }

    /// Returns the record for an entity if it is tracked.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<EntityHandle> {
        self.entities.get(&id).map(|e| Arc::clone(e.value()))
    }

    /// Runs `f` with the entity's record locked, creating it if needed.
    pub fn with<R>(&self, id: EntityId, f: impl FnOnce(&mut EntityRecord) -> R) -> R {
        let handle = self.entry(id);
        let mut record = handle.lock();
        f(&mut record)
    }

    /// Copies out every `(id, handle)` pair for a batch scan.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(EntityId, EntityHandle)> {
        self.entities
            .iter()
            .map(|e| (*e.key(), Arc::clone(e.value())))
            .collect()
    }

    /// Stops tracking an entity. Returns true if it was tracked.
    pub fn remove(&self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Stops tracking every entity.
    pub fn clear(&self) {
        self.entities.clear();
    }

    /// Returns the number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
