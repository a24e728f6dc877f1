//! Core types for decoded telemetry.
//!
//! - [`DataBlock`] is the closed set of typed payloads a DATA block can carry
//! - [`DataBlockSubtype`] selects the payload schema and names the snapshot key
//! - [`MissionState`] is the coordinator's single source of truth for where data comes from
//! - [`UpdateRate`] controls how often snapshot consumers see updates

mod data_block;
mod mission_state;
mod status;
mod update_rate;

pub use data_block::{
    AltitudeBlock, DataBlock, DataBlockSubtype, DebugMessageBlock, GnssLocationBlock,
    GnssMetadataBlock, ImuBlock, StatusBlock, TriAxisBlock,
};
pub use mission_state::MissionState;
pub use status::{Constellation, DeploymentState, FixType, SatelliteInfo, SensorStatus};
pub use update_rate::UpdateRate;
