//! Error types for ground-station telemetry processing.
//!
//! Every fallible operation in the crate returns [`TelemetryError`]. The variants fall into
//! four categories which decide how the coordinator reacts to them:
//!
//! - **Decode**: a transmission, block or log line could not be decoded. The offending
//!   item is abandoned, a warning is logged and processing continues.
//! - **Command**: an operator command was rejected. The command is a no-op and the
//!   rejection is reported in the next snapshot.
//! - **Storage**: mission log I/O failed, or output could not be delivered.
//! - **Configuration**: invalid settings, or a startup precondition that was not met.
//!
//! ```rust
//! use groundstation::{ErrorCategory, TelemetryError};
//!
//! let error = TelemetryError::BlockOverrun { declared: 32, remaining: 8 };
//! assert_eq!(error.category(), ErrorCategory::Decode);
//! assert!(error.to_string().contains("32"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// How an error propagates through the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Decode,
    Command,
    Storage,
    Configuration,
}

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Truncated packet: header needs 24 hex characters, got {length}")]
    TruncatedPacket { length: usize },

    #[error("Malformed header: {details}")]
    MalformedHeader { details: String },

    #[error("Invalid hex at position {position}: {details}")]
    InvalidHex { position: usize, details: String },

    #[error("Unknown block type {block_type}")]
    UnknownBlockType { block_type: u8 },

    #[error("Unknown data block subtype {subtype:#04x}")]
    UnknownSubtype { subtype: u8 },

    #[error("Payload too short for {subtype}: expected {expected} bytes, got {actual}")]
    PayloadTooShort { subtype: &'static str, expected: usize, actual: usize },

    #[error("Block declares {declared} bytes but only {remaining} remain in the transmission")]
    BlockOverrun { declared: usize, remaining: usize },

    #[error("No free mission name for '{name}' after {attempts} attempts")]
    NoFreeSlot { name: String, attempts: u32 },

    #[error("Replay mission '{name}' not found")]
    ReplayMissionNotFound { name: String },

    #[error("Recording already active for mission '{name}'")]
    RecordingAlreadyActive { name: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Mission log line {line}: {details}")]
    MissionLog { line: usize, details: String },

    #[error("Mission file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {details}")]
    Config { details: String },

    #[error("Channel closed: {channel}")]
    ChannelClosed { channel: &'static str },

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TelemetryError {
    /// Category deciding how the coordinator handles this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TelemetryError::TruncatedPacket { .. }
            | TelemetryError::MalformedHeader { .. }
            | TelemetryError::InvalidHex { .. }
            | TelemetryError::UnknownBlockType { .. }
            | TelemetryError::UnknownSubtype { .. }
            | TelemetryError::PayloadTooShort { .. }
            | TelemetryError::BlockOverrun { .. }
            | TelemetryError::MissionLog { .. } => ErrorCategory::Decode,
            TelemetryError::NoFreeSlot { .. }
            | TelemetryError::ReplayMissionNotFound { .. }
            | TelemetryError::RecordingAlreadyActive { .. }
            | TelemetryError::InvalidCommand { .. } => ErrorCategory::Command,
            TelemetryError::File { .. }
            | TelemetryError::ChannelClosed { .. }
            | TelemetryError::Serialization(_) => ErrorCategory::Storage,
            TelemetryError::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns whether the coordinator keeps running after this error.
    ///
    /// Only configuration errors are fatal, and only at startup.
    pub fn is_recoverable(&self) -> bool {
        self.category() != ErrorCategory::Configuration
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TelemetryError::File { path: path.into(), source }
    }

    /// Helper constructor for malformed header errors.
    pub fn malformed_header(details: impl Into<String>) -> Self {
        TelemetryError::MalformedHeader { details: details.into() }
    }

    /// Helper constructor for rejected commands.
    pub fn invalid_command(reason: impl Into<String>) -> Self {
        TelemetryError::InvalidCommand { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        TelemetryError::Config { details: details.into() }
    }

    /// Helper constructor for mission log parse errors.
    pub fn mission_log(line: usize, details: impl Into<String>) -> Self {
        TelemetryError::MissionLog { line, details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
