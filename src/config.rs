//! Ground station configuration
//!
//! Settings load from YAML; every field is optional and falls back to its default.
//!
//! ```rust
//! use groundstation::Config;
//!
//! let config = Config::from_yaml_str("missions_dir: flights\ntick_interval_ms: 50\n")?;
//! assert_eq!(config.missions_dir.to_str(), Some("flights"));
//! assert_eq!(config.mission_extension, "mission");
//! # Ok::<(), groundstation::TelemetryError>(())
//! ```

use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding mission logs.
    pub missions_dir: PathBuf,
    /// File extension of mission logs, without the dot.
    pub mission_extension: String,
    /// Mission name used by `record start` without a name.
    pub default_mission_name: String,
    /// Coordinator polling tick. Bounds command and telemetry latency.
    pub tick_interval_ms: u64,
    /// Delay between replayed blocks at speed 1.0.
    pub replay_block_interval_ms: u64,
    /// Append replayed blocks to an active recording.
    pub record_during_replay: bool,
    /// Snapshot `version` field.
    pub version: String,
    /// Snapshot `org` field.
    pub org: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            missions_dir: PathBuf::from("missions"),
            mission_extension: "mission".to_string(),
            default_mission_name: "mission".to_string(),
            tick_interval_ms: 100,
            replay_block_interval_ms: 100,
            record_during_replay: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
            org: "CU InSpace".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TelemetryError::config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(TelemetryError::config("tick_interval_ms must be non-zero"));
        }
        if self.replay_block_interval_ms == 0 {
            return Err(TelemetryError::config("replay_block_interval_ms must be non-zero"));
        }
        if self.mission_extension.is_empty() || self.mission_extension.contains('.') {
            return Err(TelemetryError::config(format!(
                "mission_extension {:?} must be a non-empty name without dots",
                self.mission_extension
            )));
        }
        if self.default_mission_name.is_empty() {
            return Err(TelemetryError::config("default_mission_name must be non-empty"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn replay_block_interval(&self) -> Duration {
        Duration::from_millis(self.replay_block_interval_ms)
    }

    /// Snapshot emission rate implied by the tick, in Hz.
    pub fn tick_hz(&self) -> f64 {
        1000.0 / self.tick_interval_ms as f64
    }
}
