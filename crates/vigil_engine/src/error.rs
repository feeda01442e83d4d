//! # Engine Error Types
//!
//! Detectors never fail: missing evidence is an inconclusive verdict, not
//! an error. The only failures that reach callers come from loading
//! configuration or starting the scan thread.

use std::io;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The document parsed but is structurally wrong.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur in the detection engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded; the previous snapshot stays active.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The batch scan thread could not be spawned.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
