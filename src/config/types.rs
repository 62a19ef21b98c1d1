//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{default_initial_delay_secs, default_interval_secs, default_io_timeout_ms};
use super::listen::ListenConfig;
use crate::coordinator::Schedule;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Coordinator configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Synchronization timing.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Coordinator clock.
    #[serde(default)]
    pub clock: ClockConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply command-line overrides on top of whatever was loaded.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(port) = overrides.port {
            self.listen.address.set_port(port);
        }
        if let Some(secs) = overrides.interval_secs {
            self.sync.interval_secs = secs;
        }
        if let Some(ms) = overrides.io_timeout_ms {
            self.sync.io_timeout_ms = ms;
        }
        if let Some(ms) = overrides.initial_offset_ms {
            self.clock.initial_offset_ms = ms;
        }
    }
}

/// Synchronization timing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Seconds between cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Seconds before the first cycle.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    /// Bound on every handshake read, poll round-trip and adjust write.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.initial_delay(), self.interval())
    }
}

/// Coordinator clock configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ClockConfig {
    /// Offset the coordinator's logical clock starts with, in milliseconds.
    #[serde(default)]
    pub initial_offset_ms: i64,
}

/// Values given on the command line. `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub interval_secs: Option<u64>,
    pub io_timeout_ms: Option<u64>,
    pub initial_offset_ms: Option<i64>,
}
