//! # Detection Reports
//!
//! What the engine emits, and where it goes. The engine never acts on a
//! report itself; a [`ReportSink`] hands it to whoever does.
//!
//! ## Sinks
//!
//! - [`TracingSink`]: logs every report at warn level
//! - [`ChannelSink`]: forwards reports to another thread
//! - [`FanoutSink`]: delivers to several sinks in order

use crossbeam_channel::{Receiver, Sender};
use vigil_core::{EntityId, Millis, Position};

use crate::config::EscalationAction;

/// Categories of anomalous behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetectionCategory {
    /// Unnatural mining trajectory.
    MiningTrace,
    /// Blocks broken faster than the tool allows.
    MiningSpeed,
    /// Airborne movement without permission.
    Flight,
    /// Flight enabled without permission.
    FlightToggle,
    /// Ground movement faster than allowed.
    GroundSpeed,
    /// Movement through solid blocks.
    NoClip,
    /// Click rate beyond human ability.
    AutoClick,
    /// Surviving more damage than possible.
    GodMode,
}

impl DetectionCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::MiningTrace,
        Self::MiningSpeed,
        Self::Flight,
        Self::FlightToggle,
        Self::GroundSpeed,
        Self::NoClip,
        Self::AutoClick,
        Self::GodMode,
    ];

    /// Returns the short machine-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MiningTrace => "mining_trace",
            Self::MiningSpeed => "mining_speed",
            Self::Flight => "flight",
            Self::FlightToggle => "flight_toggle",
            Self::GroundSpeed => "ground_speed",
            Self::NoClip => "no_clip",
            Self::AutoClick => "auto_click",
            Self::GodMode => "god_mode",
        }
    }

    /// Returns true for categories reported by the batch scan.
    #[inline]
    #[must_use]
    pub const fn is_batch(self) -> bool {
        matches!(self, Self::MiningTrace | Self::MiningSpeed)
    }
}

impl std::fmt::Display for DetectionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An enforcement recommendation attached to a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enforcement {
    /// What to do.
    pub action: EscalationAction,
    /// What to tell the entity.
    pub message: String,
}

/// A single detection.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionReport {
    /// The offending entity.
    pub entity: EntityId,
    /// What was detected.
    pub category: DetectionCategory,
    /// Human-readable justification.
    pub description: String,
    /// Where it happened, when known.
    pub location: Option<Position>,
    /// When the detection fired.
    pub timestamp_ms: Millis,
    /// Reports accumulated by the entity, this one included.
    pub violation_total: u32,
    /// Recommendation, when escalation triggered.
    pub enforcement: Option<Enforcement>,
}

/// Receives every report exactly once.
pub trait ReportSink: Send + Sync {
    /// Delivers a report.
    fn notify(&self, report: DetectionReport);
}

/// Logs reports through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn notify(&self, report: DetectionReport) {
        let action = report.enforcement.as_ref().map(|e| e.action);
        match report.location {
            Some(loc) => tracing::warn!(
                entity = %report.entity,
                category = %report.category,
                total = report.violation_total,
                x = loc.x,
                y = loc.y,
                z = loc.z,
                action = ?action,
                "{}",
                report.description
            ),
            None => tracing::warn!(
                entity = %report.entity,
                category = %report.category,
                total = report.violation_total,
                action = ?action,
                "{}",
                report.description
            ),
        }
    }
}

/// Forwards reports over a channel, typically to the host's main thread.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<DetectionReport>,
}

impl ChannelSink {
    /// Wraps an existing sender.
    #[must_use]
    pub const fn new(tx: Sender<DetectionReport>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiver that drains it.
    #[must_use]
    pub fn unbounded() -> (Self, Receiver<DetectionReport>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl ReportSink for ChannelSink {
    fn notify(&self, report: DetectionReport) {
        if let Err(err) = self.tx.send(report) {
            tracing::debug!(entity = %err.0.entity, "report receiver dropped");
        }
    }
}

/// Delivers each report to several sinks, in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for FanoutSink {
    fn notify(&self, report: DetectionReport) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.notify(report.clone());
            }
            last.notify(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DetectionReport {
        DetectionReport {
            entity: EntityId(5),
            category: DetectionCategory::NoClip,
            description: "path crosses solid block at (0, 64, 0)".to_string(),
            location: Some(Position::new(0.5, 64.0, 0.5)),
            timestamp_ms: 1_000,
            violation_total: 1,
            enforcement: None,
        }
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, rx) = ChannelSink::unbounded();
        sink.notify(report());

        let received = rx.try_recv().unwrap();
        assert_eq!(received, report());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::unbounded();
        drop(rx);
        sink.notify(report());
    }

    #[test]
    fn test_fanout_delivers_to_all() {
        let (a, rx_a) = ChannelSink::unbounded();
        let (b, rx_b) = ChannelSink::unbounded();
        let fanout = FanoutSink::new().with(a).with(TracingSink).with(b);

        assert_eq!(fanout.len(), 3);
        fanout.notify(report());

        assert_eq!(rx_a.len(), 1);
        assert_eq!(rx_b.len(), 1);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(DetectionCategory::MiningTrace.to_string(), "mining_trace");
        assert!(DetectionCategory::MiningSpeed.is_batch());
        assert!(!DetectionCategory::Flight.is_batch());
        assert_eq!(DetectionCategory::ALL.len(), 8);
    }
}
