//! Configuration system.
//!
//! Layered runtime configuration: built-in defaults, then an optional TOML
//! file, then `BACKSPIN__*` environment overrides (e.g.
//! `BACKSPIN__POLLER__INTERVAL_MS=2000`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackspinConfig {
    /// Progress poller cadence
    #[serde(default)]
    pub poller: PollerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Progress poller cadence.
///
/// A regular `start` waits `initial_delay_ms` before the first poll — a
/// freshly accepted rewind takes a moment to show up server-side. A
/// force-start bypasses the delay entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    5_000
}

fn default_interval_ms() -> u64 {
    10_000
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollerConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl BackspinConfig {
    /// Load configuration.
    ///
    /// Priority order (highest to lowest):
    /// 1. `BACKSPIN__*` environment variables
    /// 2. The given configuration file, when present
    /// 3. Defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            if let Some(path) = path.to_str() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("BACKSPIN").separator("__"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
