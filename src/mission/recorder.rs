//! Mission recorder
//!
//! Mission logs live in one directory, one file per mission, named
//! `<mission>.<extension>`. Every append opens, writes and closes the file.

use super::log::MissionLogHeader;
use crate::protocol::BlockTriple;
use crate::{Config, Result, TelemetryError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Highest `_N` suffix tried when a mission name is taken.
pub const MAX_NAME_SUFFIX: u32 = 49;

/// An active or finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionRecord {
    pub name: String,
    pub epoch: u64,
    pub path: PathBuf,
    pub recording: bool,
}

/// Creates, lists and appends to mission logs in one directory.
#[derive(Debug, Clone)]
pub struct MissionRecorder {
    dir: PathBuf,
    extension: String,
}

impl MissionRecorder {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self { dir: dir.into(), extension: extension.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.missions_dir, &config.mission_extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the missions directory if needed and check it can be listed.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| TelemetryError::file_error(&self.dir, e))?;
        fs::read_dir(&self.dir).map_err(|e| TelemetryError::file_error(&self.dir, e))?;
        Ok(())
    }

    /// Path of the log for mission `name`.
    pub fn mission_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }

    /// Names of all recorded missions, sorted. Read from disk on every call.
    pub fn list_missions(&self) -> Result<Vec<String>> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| TelemetryError::file_error(&self.dir, e))?;

        let mut missions: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension().and_then(|s| s.to_str()) == Some(self.extension.as_str())
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();

        missions.sort();
        Ok(missions)
    }

    /// Find a free mission name starting from `proposed`, trying `proposed_1` through
    /// `proposed_49` when it is taken.
    pub fn reserve_path(&self, proposed: &str) -> Result<(String, PathBuf)> {
        validate_name(proposed)?;

        let path = self.mission_path(proposed);
        if !path.exists() {
            return Ok((proposed.to_string(), path));
        }

        for suffix in 1..=MAX_NAME_SUFFIX {
            let name = format!("{}_{}", proposed, suffix);
            let path = self.mission_path(&name);
            if !path.exists() {
                debug!("Mission '{}' exists, using '{}'", proposed, name);
                return Ok((name, path));
            }
        }

        Err(TelemetryError::NoFreeSlot { name: proposed.to_string(), attempts: MAX_NAME_SUFFIX })
    }

    /// Create a new mission log and write its header line.
    pub fn create(&self, proposed: &str, epoch: u64) -> Result<MissionRecord> {
        let (name, path) = self.reserve_path(proposed)?;
        let header = MissionLogHeader { recording: true, epoch };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| TelemetryError::file_error(&path, e))?;
        writeln!(file, "{}", header).map_err(|e| TelemetryError::file_error(&path, e))?;

        info!("Recording mission '{}' to {}", name, path.display());
        Ok(MissionRecord { name, epoch, path, recording: true })
    }
}

/// Append one block triple to a mission log.
pub fn append_block(path: &Path, triple: &BlockTriple) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| TelemetryError::file_error(path, e))?;
    writeln!(file, "{}", triple).map_err(|e| TelemetryError::file_error(path, e))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\', '.']) || name.trim() != name {
        return Err(TelemetryError::invalid_command(format!(
            "mission name {:?} must be non-empty without path separators, dots or edge spaces",
            name
        )));
    }
    Ok(())
}
