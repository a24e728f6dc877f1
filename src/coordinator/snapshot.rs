//! Outbound snapshot of the coordinator's state
//!
//! A [`Snapshot`] is an immutable value built after every state-affecting event. Its
//! serialized shape is what the control transport forwards to consumers:
//!
//! ```text
//! { version, org,
//!   status: { mission, serial, radio, rocket },
//!   telemetry_data: { <subtype name>: <decoded block> },
//!   replay: { status, speed, mission_list },
//!   last_error }
//! ```

use crate::replay::PlaybackState;
use crate::stream::ThrottleExt;
use crate::types::{DataBlock, DeploymentState, MissionState, SensorStatus, StatusBlock, UpdateRate};
use crate::Result;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Latest decoded block per subtype name, excluding STATUS.
pub type TelemetrySnapshot = BTreeMap<String, DataBlock>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: String,
    pub org: String,
    pub status: Status,
    pub telemetry_data: TelemetrySnapshot,
    pub replay: ReplayStatus,
    /// Most recent rejected command, cleared by the next accepted one.
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub mission: MissionStatus,
    pub serial: SerialStatus,
    pub radio: RadioStatus,
    pub rocket: RocketStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MissionStatus {
    /// Mission being recorded or replayed; empty when neither.
    pub name: String,
    pub epoch: u64,
    pub state: MissionState,
    pub recording: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SerialStatus {
    pub available_ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RadioStatus {
    pub connected: bool,
    /// Empty when disconnected.
    pub connected_port: String,
}

/// Rocket health, merged field by field from STATUS blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RocketStatus {
    pub call_sign: String,
    /// Mission time of the most recent STATUS block.
    pub mission_time: u32,
    pub kx134_state: SensorStatus,
    pub altimeter_state: SensorStatus,
    pub imu_state: SensorStatus,
    pub sd_driver_state: SensorStatus,
    pub gnss_state: SensorStatus,
    pub deployment_state: DeploymentState,
    pub sd_blocks_recorded: u32,
    pub sd_checkouts_missed: u32,
    /// Mission time of the most recent DATA block of any subtype, -1 before the first.
    pub last_mission_time: i64,
}

impl Default for RocketStatus {
    fn default() -> Self {
        Self {
            call_sign: String::new(),
            mission_time: 0,
            kx134_state: SensorStatus::default(),
            altimeter_state: SensorStatus::default(),
            imu_state: SensorStatus::default(),
            sd_driver_state: SensorStatus::default(),
            gnss_state: SensorStatus::default(),
            deployment_state: DeploymentState::default(),
            sd_blocks_recorded: 0,
            sd_checkouts_missed: 0,
            last_mission_time: -1,
        }
    }
}

impl RocketStatus {
    /// Overwrite the health fields with those of a STATUS block.
    pub fn merge(&mut self, status: &StatusBlock) {
        self.mission_time = status.mission_time;
        self.kx134_state = status.kx134_state;
        self.altimeter_state = status.altimeter_state;
        self.imu_state = status.imu_state;
        self.sd_driver_state = status.sd_driver_state;
        self.gnss_state = status.gnss_state;
        self.deployment_state = status.deployment_state;
        self.sd_blocks_recorded = status.sd_blocks_recorded;
        self.sd_checkouts_missed = status.sd_checkouts_missed;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStatus {
    pub status: PlaybackState,
    pub speed: f64,
    /// Recorded missions available for replay.
    pub mission_list: Vec<String>,
}

impl Default for ReplayStatus {
    fn default() -> Self {
        Self { status: PlaybackState::Stopped, speed: 1.0, mission_list: Vec::new() }
    }
}

/// Snapshots from a watch channel as a stream, throttled to `rate`.
///
/// `source_hz` is the coordinator's tick rate; rates at or above it are delivered natively.
pub fn snapshot_stream(
    latest: watch::Receiver<Option<Arc<Snapshot>>>,
    rate: UpdateRate,
    source_hz: f64,
) -> impl Stream<Item = Arc<Snapshot>> + Send + 'static {
    let snapshots = WatchStream::new(latest).filter_map(|opt| async move { opt });

    match rate.throttle_interval(source_hz) {
        None => snapshots.boxed(),
        Some(interval) => snapshots.throttle(interval).boxed(),
    }
}
