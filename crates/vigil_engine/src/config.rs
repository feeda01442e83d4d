//! # Engine Configuration
//!
//! A single immutable snapshot of every tunable. The engine holds the
//! snapshot behind an `Arc` and swaps the pointer on reload, so detectors
//! never observe a half-applied configuration.
//!
//! ## File format
//!
//! ```toml
//! [general]
//! check_interval_ms = 1000
//!
//! [trace]
//! sensitivity = 7
//!
//! [break_speed.tool_durations]
//! diamond_pickaxe = 900
//! ```
//!
//! Every section and key is optional. Out-of-range values fall back to
//! their defaults with a warning; unknown top-level sections are rejected.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use vigil_core::{EntityId, Millis, Tool};

use crate::error::{ConfigError, ConfigResult};

/// Top-level sections accepted in a configuration document.
const SECTIONS: [&str; 10] = [
    "general",
    "trace",
    "break_speed",
    "flight",
    "ground_speed",
    "no_clip",
    "auto_click",
    "god_mode",
    "escalation",
    "exemptions",
];

/// Lowest accepted batch scan period.
pub const MIN_CHECK_INTERVAL_MS: Millis = 50;

/// Global switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Master switch; when false every inbound call is a no-op.
    pub enabled: bool,
    /// Batch scan period.
    pub check_interval_ms: Millis,
    /// Log detector rationale at debug level.
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_ms: 1000,
            debug: false,
        }
    }
}

/// Mining trajectory detector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// 1 (lenient) to 10 (strict), centred at 5.
    pub sensitivity: u8,
    /// Window of break events considered.
    pub window_ms: Millis,
    /// Batch-path suppression after a report.
    pub cooldown_ms: Millis,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: 5,
            window_ms: 60_000,
            cooldown_ms: 2_000,
        }
    }
}

impl TraceConfig {
    /// Returns the signed distance of the sensitivity from its centre.
    #[inline]
    #[must_use]
    pub fn sensitivity_offset(&self) -> f64 {
        f64::from(i32::from(self.sensitivity) - 5)
    }
}

/// Mining speed detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakSpeedConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Tolerated speed-up over the expected break duration.
    pub normal_speed_multiplier: f64,
    /// Window of break events considered.
    pub detection_window_ms: Millis,
    /// Half the number of events needed before any verdict.
    pub min_detection_count: u32,
    /// Batch-path suppression after a report.
    pub cooldown_ms: Millis,
    /// Per-tool expected break durations, keyed by tool name.
    pub tool_durations: BTreeMap<String, Millis>,
}

impl Default for BreakSpeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normal_speed_multiplier: 1.5,
            detection_window_ms: 5_000,
            min_detection_count: 3,
            cooldown_ms: 10_000,
            tool_durations: BTreeMap::new(),
        }
    }
}

impl BreakSpeedConfig {
    /// Returns the configured duration override for a tool, if any.
    #[must_use]
    pub fn duration_override(&self, tool: Tool) -> Option<Millis> {
        self.tool_durations.get(&tool.name()).copied()
    }
}

/// Flight detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Largest legal upward delta per sample.
    pub max_vertical_speed: f64,
    /// Largest legal airborne horizontal delta per sample.
    pub max_horizontal_speed: f64,
    /// Consecutive airborne level samples tolerated.
    pub min_hover_samples: u32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_vertical_speed: 0.6,
            max_horizontal_speed: 1.0,
            min_hover_samples: 20,
        }
    }
}

/// Ground speed detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundSpeedConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Largest legal walking delta per sample.
    pub max_walk_speed: f64,
    /// Largest legal sprinting delta per sample.
    pub max_sprint_speed: f64,
    /// Consecutive violations before a report.
    pub min_violations: u32,
}

impl Default for GroundSpeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_walk_speed: 0.35,
            max_sprint_speed: 0.7,
            min_violations: 3,
        }
    }
}

/// No-clip detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoClipConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Consecutive violations before a report.
    pub min_violations: u32,
    /// Longest move that is path-checked; anything longer is a teleport.
    pub max_distance: f64,
}

impl Default for NoClipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_violations: 3,
            max_distance: 10.0,
        }
    }
}

/// Click-rate detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoClickConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Largest legal clicks per second.
    pub max_clicks_per_second: f64,
    /// Window clicks are counted over.
    pub window_ms: Millis,
    /// Consecutive violations before a report.
    pub min_violations: u32,
}

impl Default for AutoClickConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_clicks_per_second: 20.0,
            window_ms: 1_000,
            min_violations: 3,
        }
    }
}

/// Damage anomaly detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GodModeConfig {
    /// Enables the detector.
    pub enabled: bool,
    /// Window damage is summed over.
    pub window_ms: Millis,
    /// Survivable damage as a multiple of maximum health.
    pub health_multiplier: f64,
}

impl Default for GodModeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 5_000,
            health_multiplier: 2.0,
        }
    }
}

/// Enforcement action recommended once an entity accumulates enough reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationAction {
    /// Warn the entity.
    #[default]
    Warn,
    /// Disconnect the entity.
    Kick,
    /// Ban the entity.
    Ban,
}

impl std::fmt::Display for EscalationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Warn => "warn",
            Self::Kick => "kick",
            Self::Ban => "ban",
        })
    }
}

/// Escalation recommendations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Attach recommendations to reports.
    pub enabled: bool,
    /// Reports accumulated before a recommendation.
    pub warning_count: u32,
    /// What to recommend.
    pub action: EscalationAction,
    /// Message for the enforcing side to show.
    pub message: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            warning_count: 3,
            action: EscalationAction::Warn,
            message: "Abnormal behaviour detected. Contact staff if you believe this is a mistake."
                .to_string(),
        }
    }
}

/// Entities the engine never records or checks.
///
/// Lookups go through a set rebuilt by [`EngineConfig::validate`], so the
/// list must be edited before the snapshot is handed to the engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExemptionConfig {
    /// Exempt entity ids.
    pub entities: Vec<EntityId>,
    #[serde(skip)]
    lookup: HashSet<EntityId>,
}

impl ExemptionConfig {
    /// Returns true if `entity` is exempt.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.lookup.contains(&entity)
    }

    fn rebuild(&mut self) {
        self.lookup = self.entities.iter().copied().collect();
    }
}

impl PartialEq for ExemptionConfig {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
    }
}

impl Eq for ExemptionConfig {}

/// Complete engine configuration snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global switches.
    pub general: GeneralConfig,
    /// Mining trajectory detector.
    pub trace: TraceConfig,
    /// Mining speed detector.
    pub break_speed: BreakSpeedConfig,
    /// Flight detector.
    pub flight: FlightConfig,
    /// Ground speed detector.
    pub ground_speed: GroundSpeedConfig,
    /// No-clip detector.
    pub no_clip: NoClipConfig,
    /// Click-rate detector.
    pub auto_click: AutoClickConfig,
    /// Damage anomaly detector.
    pub god_mode: GodModeConfig,
    /// Escalation recommendations.
    pub escalation: EscalationConfig,
    /// Exempt entities.
    pub exemptions: ExemptionConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped values
    /// and [`ConfigError::Invalid`] for unknown top-level sections.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(source)?;

        if let Some(unknown) = table.keys().find(|k| !SECTIONS.contains(&k.as_str())) {
            return Err(ConfigError::Invalid(format!("unknown section `{unknown}`")));
        }

        let config: Self = toml::Value::Table(table).try_into()?;
        Ok(config.validated())
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serializes the snapshot back to TOML.
    ///
    /// # Errors
    ///
    /// Fails only if a value has no TOML representation.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Returns the configuration with every out-of-range value replaced by
    /// its default.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Replaces out-of-range values with defaults, logging each fallback.
    pub fn validate(&mut self) {
        let general = GeneralConfig::default();
        if self.general.check_interval_ms < MIN_CHECK_INTERVAL_MS {
            fallback("general.check_interval_ms", &mut self.general.check_interval_ms, general.check_interval_ms);
        }

        let trace = TraceConfig::default();
        if !(1..=10).contains(&self.trace.sensitivity) {
            fallback("trace.sensitivity", &mut self.trace.sensitivity, trace.sensitivity);
        }
        positive_u64("trace.window_ms", &mut self.trace.window_ms, trace.window_ms);

        let break_speed = BreakSpeedConfig::default();
        positive_f64(
            "break_speed.normal_speed_multiplier",
            &mut self.break_speed.normal_speed_multiplier,
            break_speed.normal_speed_multiplier,
        );
        positive_u64(
            "break_speed.detection_window_ms",
            &mut self.break_speed.detection_window_ms,
            break_speed.detection_window_ms,
        );
        positive_u32(
            "break_speed.min_detection_count",
            &mut self.break_speed.min_detection_count,
            break_speed.min_detection_count,
        );
        self.break_speed.tool_durations.retain(|key, duration| {
            if key.parse::<Tool>().is_err() {
                tracing::warn!(key = %key, "ignoring duration override for unknown tool");
                return false;
            }
            if *duration == 0 {
                tracing::warn!(key = %key, "ignoring zero duration override");
                return false;
            }
            true
        });
        // Normalise keys so lookups by `Tool::name` match regardless of case.
        self.break_speed.tool_durations = std::mem::take(&mut self.break_speed.tool_durations)
            .into_iter()
            .map(|(key, duration)| (key.trim().to_ascii_lowercase(), duration))
            .collect();

        let flight = FlightConfig::default();
        positive_f64("flight.max_vertical_speed", &mut self.flight.max_vertical_speed, flight.max_vertical_speed);
        positive_f64(
            "flight.max_horizontal_speed",
            &mut self.flight.max_horizontal_speed,
            flight.max_horizontal_speed,
        );
        positive_u32("flight.min_hover_samples", &mut self.flight.min_hover_samples, flight.min_hover_samples);

        let ground = GroundSpeedConfig::default();
        positive_f64("ground_speed.max_walk_speed", &mut self.ground_speed.max_walk_speed, ground.max_walk_speed);
        positive_f64(
            "ground_speed.max_sprint_speed",
            &mut self.ground_speed.max_sprint_speed,
            ground.max_sprint_speed,
        );
        positive_u32("ground_speed.min_violations", &mut self.ground_speed.min_violations, ground.min_violations);

        let no_clip = NoClipConfig::default();
        positive_u32("no_clip.min_violations", &mut self.no_clip.min_violations, no_clip.min_violations);
        positive_f64("no_clip.max_distance", &mut self.no_clip.max_distance, no_clip.max_distance);

        let auto_click = AutoClickConfig::default();
        positive_f64(
            "auto_click.max_clicks_per_second",
            &mut self.auto_click.max_clicks_per_second,
            auto_click.max_clicks_per_second,
        );
        positive_u64("auto_click.window_ms", &mut self.auto_click.window_ms, auto_click.window_ms);
        positive_u32("auto_click.min_violations", &mut self.auto_click.min_violations, auto_click.min_violations);

        let god_mode = GodModeConfig::default();
        positive_u64("god_mode.window_ms", &mut self.god_mode.window_ms, god_mode.window_ms);
        positive_f64("god_mode.health_multiplier", &mut self.god_mode.health_multiplier, god_mode.health_multiplier);

        let escalation = EscalationConfig::default();
        positive_u32("escalation.warning_count", &mut self.escalation.warning_count, escalation.warning_count);

        self.exemptions.rebuild();
    }

    /// Returns the longest window any detector reads break history over.
    #[must_use]
    pub fn break_retention_ms(&self) -> Millis {
        self.trace.window_ms.max(self.break_speed.detection_window_ms)
    }
}

fn fallback<T: std::fmt::Debug + Copy>(key: &str, value: &mut T, default: T) {
    tracing::warn!(key, invalid = ?*value, default = ?default, "config value out of range, using default");
    *value = default;
}

fn positive_u64(key: &str, value: &mut u64, default: u64) {
    if *value == 0 {
        fallback(key, value, default);
    }
}

fn positive_u32(key: &str, value: &mut u32, default: u32) {
    if *value == 0 {
        fallback(key, value, default);
    }
}

fn positive_f64(key: &str, value: &mut f64, default: f64) {
    if !value.is_finite() || *value <= 0.0 {
        fallback(key, value, default);
    }
}
