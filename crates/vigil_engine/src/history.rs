//! # Action History
//!
//! Sliding-window logs of what an entity has done. Logs are kept in
//! arrival order: for breaks the order encodes the mining trajectory, so
//! entries are never sorted.
//!
//! A window query includes an entry when `now - timestamp <= window`.
//! Entries stamped after `now` count as current.

use std::collections::VecDeque;

use vigil_core::{BreakEvent, ClickSample, DamageSample, Millis, Position, Timestamped};

/// Hard bound on logged clicks per entity.
pub const CLICK_CAPACITY: usize = 256;

/// Hard bound on logged damage samples per entity.
pub const DAMAGE_CAPACITY: usize = 128;

/// An insertion-ordered log of timestamped entries, optionally bounded.
#[derive(Clone, Debug)]
pub struct TimedLog<T> {
    entries: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> Default for TimedLog<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> TimedLog<T> {
    /// Creates a log limited only by pruning.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: None,
        }
    }

    /// Creates a log that drops its oldest entry once `capacity` is reached.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: Some(capacity.max(1)),
        }
    }
}

impl<T: Timestamped + Clone> TimedLog<T> {
    /// Appends an entry in arrival order.
    pub fn record(&mut self, entry: T) {
        if let Some(cap) = self.capacity {
            while self.entries.len() >= cap {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(entry);
    }

    /// Iterates the entries inside the window, in arrival order.
    pub fn iter_window(&self, window: Millis, now: Millis) -> impl Iterator<Item = &T> + '_ {
        self.entries
            .iter()
            .filter(move |e| now.saturating_sub(e.timestamp()) <= window)
    }

    /// Returns the entries inside the window, in arrival order.
    #[must_use]
    pub fn windowed(&self, window: Millis, now: Millis) -> Vec<T> {
        self.iter_window(window, now).cloned().collect()
    }

    /// Returns how many entries fall inside the window.
    #[must_use]
    pub fn count_window(&self, window: Millis, now: Millis) -> usize {
        self.iter_window(window, now).count()
    }

    /// Removes entries older than `max_age`.
    pub fn prune(&mut self, max_age: Millis, now: Millis) {
        self.entries
            .retain(|e| now.saturating_sub(e.timestamp()) <= max_age);
    }

    /// Returns the number of logged entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates every entry in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }
}

/// Everything observed about one entity.
#[derive(Clone, Debug)]
pub struct EntityHistory {
    /// Broken blocks, arrival order.
    pub breaks: TimedLog<BreakEvent>,
    /// Left clicks.
    pub clicks: TimedLog<ClickSample>,
    /// Damage taken.
    pub damage: TimedLog<DamageSample>,
    /// Last position reported by a move.
    pub last_position: Option<Position>,
}

impl Default for EntityHistory {
    fn default() -> Self {
        Self {
            breaks: TimedLog::unbounded(),
            clicks: TimedLog::bounded(CLICK_CAPACITY),
            damage: TimedLog::bounded(DAMAGE_CAPACITY),
            last_position: None,
        }
    }
}

impl EntityHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every logged action.
    pub fn clear(&mut self) {
        self.breaks.clear();
        self.clicks.clear();
        self.damage.clear();
        self.last_position = None;
    }
}
