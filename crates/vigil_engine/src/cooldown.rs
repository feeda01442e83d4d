//! # Cooldowns
//!
//! Batch-path suppression after a report. Each entry stores its expiry
//! instant; an entry is live while `now < expiry` and is dropped the first
//! time it is seen expired. No sweeper thread is needed.

use dashmap::DashMap;
use vigil_core::{EntityId, Millis};

use crate::report::DetectionCategory;

/// Per-category sets of suppressed entities.
#[derive(Debug, Default)]
pub struct CooldownSet {
    expiries: DashMap<(EntityId, DetectionCategory), Millis>,
}

impl CooldownSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses `entity` in `category` until `now + duration`.
    pub fn start(&self, entity: EntityId, category: DetectionCategory, duration: Millis, now: Millis) {
        self.expiries
            .insert((entity, category), now.saturating_add(duration));
    }

    /// Returns true while the entity is suppressed in the category.
    pub fn is_active(&self, entity: EntityId, category: DetectionCategory, now: Millis) -> bool {
        let key = (entity, category);
        let live = match self.expiries.get(&key) {
            Some(expiry) => now < *expiry,
            None => return false,
        };
        if !live {
            self.expiries.remove_if(&key, |_, expiry| now >= *expiry);
        }
        live
    }

    /// Returns the number of live entries in a category.
    #[must_use]
    pub fn live_count(&self, category: DetectionCategory, now: Millis) -> usize {
        self.expiries
            .iter()
            .filter(|e| e.key().1 == category && now < *e.value())
            .count()
    }

    /// Drops every entry for an entity.
    pub fn remove_entity(&self, entity: EntityId) {
        self.expiries.retain(|(id, _), _| *id != entity);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.expiries.clear();
    }
}
