//! Telemetry core for a sounding-rocket ground station.
//!
//! The crate decodes the rocket's radio protocol, owns the ground station's mission
//! state, records received blocks to mission logs and replays recorded missions at an
//! adjustable speed.
//!
//! # Features
//!
//! - **Protocol decoding**: packet and block headers, typed data block payloads
//! - **Mission state**: a single coordinator task fed by message queues
//! - **Recording**: append-only mission logs, one line per block
//! - **Replay**: recorded missions replayed through the live decode path
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use groundstation::{Config, GroundStation, SerialEvent, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> groundstation::Result<()> {
//!     let station = GroundStation::start(Config::default())?;
//!     station.report_serial(SerialEvent::Connected("test".into()))?;
//!     station.send_command_words(&["telemetry", "record", "start", "launch"])?;
//!
//!     let mut snapshots = Box::pin(station.subscribe(UpdateRate::Max(2)));
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("{}", snapshot.to_json()?);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire protocol and mission logs
pub mod mission;
pub mod protocol;

// Task-based processing
pub mod coordinator;
pub mod replay;
pub mod stream;

// Core exports
pub use config::Config;
pub use error::*;
pub use types::*;

// Main API exports
pub use coordinator::{Command, Coordinator, CoordinatorHandle, SerialCommand, SerialEvent, Snapshot};
pub use mission::{MissionRecord, MissionRecorder};
pub use protocol::{BlockTriple, DecodedBlock, Transmission};
pub use replay::{PlaybackState, ReplaySession};

/// Entry point for running a ground station.
///
/// # Examples
///
/// ```rust,no_run
/// use groundstation::GroundStation;
///
/// #[tokio::main]
/// async fn main() -> groundstation::Result<()> {
///     let station = GroundStation::start_from_file("groundstation.yaml")?;
///     station.push_transmission("524F434B4554...")?;
///     Ok(())
/// }
/// ```
pub struct GroundStation;

impl GroundStation {
    /// Start a coordinator task with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid or the missions
    /// directory cannot be created.
    pub fn start(config: Config) -> Result<CoordinatorHandle> {
        Coordinator::spawn(config)
    }

    /// Load a YAML configuration file and start a coordinator task.
    pub fn start_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<CoordinatorHandle> {
        Self::start(Config::load(path)?)
    }
}
