//! # VIGIL Engine - The Watcher
//!
//! Real-time behavioural anomaly detection for a multiplayer voxel world.
//!
//! ## Features
//!
//! - **Mining Trace**: straight lines, vertical shafts, machine rhythm
//! - **Mining Speed**: breaks faster than the held tool allows
//! - **Movement**: unpermitted flight, ground speed, passing through walls
//! - **Combat**: click rates and damage nobody survives
//!
//! ## Architecture
//!
//! ```text
//! HOST                                   ENGINE
//!   │                                      │
//!   │─── break / move / click / damage ──►│ record + event-path checks
//!   │                                      │
//!   │                              ┌───────┴────────┐
//!   │                              │ BatchScheduler │ trace, break speed
//!   │                              └───────┬────────┘
//!   │                                      ▼
//!   │◄──────────── DetectionReport ───── ReportSink
//! ```
//!
//! The engine only reports. Acting on a report (warning, kicking, banning)
//! is up to whoever drains the sink.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod cooldown;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod history;
pub mod report;
pub mod scheduler;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, EscalationAction};
pub use detectors::{MoveContext, Verdict};
pub use engine::{DetectionEngine, EngineStats, InteractKind};
pub use error::{ConfigError, EngineError, EngineResult};
pub use report::{
    ChannelSink, DetectionCategory, DetectionReport, Enforcement, FanoutSink, ReportSink,
    TracingSink,
};
pub use scheduler::{BatchScheduler, SchedulerStats};
