//! Typed data block payloads
//!
//! A DATA block carries one of a closed set of payload schemas, selected by the 6-bit
//! block subtype. Each variant records the rocket's `mission_time` (milliseconds since
//! power-on) plus its own measurements, already converted to engineering units.

use super::status::{DeploymentState, FixType, SatelliteInfo, SensorStatus};
use serde::Serialize;

/// Payload schema of a DATA block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBlockSubtype {
    DebugMessage,
    Status,
    Altitude,
    Acceleration,
    AngularVelocity,
    GnssLocation,
    GnssMetadata,
    Imu,
}

impl DataBlockSubtype {
    /// Every decodable subtype.
    pub const ALL: [DataBlockSubtype; 8] = [
        DataBlockSubtype::DebugMessage,
        DataBlockSubtype::Status,
        DataBlockSubtype::Altitude,
        DataBlockSubtype::Acceleration,
        DataBlockSubtype::AngularVelocity,
        DataBlockSubtype::GnssLocation,
        DataBlockSubtype::GnssMetadata,
        DataBlockSubtype::Imu,
    ];

    /// Map a raw 6-bit subtype value. `None` for values without a decoder.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(DataBlockSubtype::DebugMessage),
            0x01 => Some(DataBlockSubtype::Status),
            0x03 => Some(DataBlockSubtype::Altitude),
            0x04 => Some(DataBlockSubtype::Acceleration),
            0x05 => Some(DataBlockSubtype::AngularVelocity),
            0x06 => Some(DataBlockSubtype::GnssLocation),
            0x07 => Some(DataBlockSubtype::GnssMetadata),
            0x0A => Some(DataBlockSubtype::Imu),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            DataBlockSubtype::DebugMessage => 0x00,
            DataBlockSubtype::Status => 0x01,
            DataBlockSubtype::Altitude => 0x03,
            DataBlockSubtype::Acceleration => 0x04,
            DataBlockSubtype::AngularVelocity => 0x05,
            DataBlockSubtype::GnssLocation => 0x06,
            DataBlockSubtype::GnssMetadata => 0x07,
            DataBlockSubtype::Imu => 0x0A,
        }
    }

    /// Lowercase name, used as the telemetry snapshot key.
    pub fn name(self) -> &'static str {
        match self {
            DataBlockSubtype::DebugMessage => "debug_message",
            DataBlockSubtype::Status => "status",
            DataBlockSubtype::Altitude => "altitude",
            DataBlockSubtype::Acceleration => "acceleration",
            DataBlockSubtype::AngularVelocity => "angular_velocity",
            DataBlockSubtype::GnssLocation => "gnss_location",
            DataBlockSubtype::GnssMetadata => "gnss_metadata",
            DataBlockSubtype::Imu => "imu",
        }
    }

    /// Smallest payload the fixed layout of this subtype needs.
    pub fn min_payload_len(self) -> usize {
        match self {
            DataBlockSubtype::DebugMessage => 4,
            DataBlockSubtype::Status => 20,
            DataBlockSubtype::Altitude => 16,
            DataBlockSubtype::Acceleration | DataBlockSubtype::AngularVelocity => 12,
            DataBlockSubtype::GnssLocation => 32,
            DataBlockSubtype::GnssMetadata => 12,
            DataBlockSubtype::Imu => 26,
        }
    }
}

impl std::fmt::Display for DataBlockSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugMessageBlock {
    pub mission_time: u32,
    pub message: String,
}

/// Subsystem health and flight phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusBlock {
    pub mission_time: u32,
    pub kx134_state: SensorStatus,
    pub altimeter_state: SensorStatus,
    pub imu_state: SensorStatus,
    pub sd_driver_state: SensorStatus,
    pub gnss_state: SensorStatus,
    pub deployment_state: DeploymentState,
    pub sd_blocks_recorded: u32,
    pub sd_checkouts_missed: u32,
}

/// Barometric altimeter sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AltitudeBlock {
    pub mission_time: u32,
    /// Pascals.
    pub pressure: i32,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Metres.
    pub altitude: f64,
}

/// Three-axis sample shared by the acceleration and angular velocity layouts.
///
/// Raw axis counts are scaled by the full-scale range: `raw * fsr / 32768`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriAxisBlock {
    pub mission_time: u32,
    pub fsr: i16,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GnssLocationBlock {
    pub mission_time: u32,
    /// Decimal degrees.
    pub latitude: f64,
    /// Decimal degrees.
    pub longitude: f64,
    pub utc_time: u32,
    /// Metres.
    pub altitude: f64,
    /// Knots.
    pub speed: f64,
    /// Degrees.
    pub course: f64,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    pub sats: u8,
    pub fix_type: FixType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GnssMetadataBlock {
    pub mission_time: u32,
    /// PRNs of GPS satellites used in the fix.
    pub gps_sats_in_use: Vec<u8>,
    /// Slot numbers of GLONASS satellites used in the fix.
    pub glonass_sats_in_use: Vec<u8>,
    pub sats_in_view: Vec<SatelliteInfo>,
}

/// Raw MPU9250 sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuBlock {
    pub mission_time: u32,
    pub accel_x: i16,
    pub accel_y: i16,
    pub accel_z: i16,
    pub temperature: i16,
    pub gyro_x: i16,
    pub gyro_y: i16,
    pub gyro_z: i16,
    pub mag_x: i16,
    pub mag_y: i16,
    pub mag_z: i16,
    pub mag_overflow: bool,
}

/// A decoded DATA block.
///
/// Serializes as the bare fields of its variant; the subtype is carried by the
/// snapshot key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataBlock {
    DebugMessage(DebugMessageBlock),
    Status(StatusBlock),
    Altitude(AltitudeBlock),
    Acceleration(TriAxisBlock),
    AngularVelocity(TriAxisBlock),
    GnssLocation(GnssLocationBlock),
    GnssMetadata(GnssMetadataBlock),
    Imu(ImuBlock),
}

impl DataBlock {
    pub fn subtype(&self) -> DataBlockSubtype {
        match self {
            DataBlock::DebugMessage(_) => DataBlockSubtype::DebugMessage,
            DataBlock::Status(_) => DataBlockSubtype::Status,
            DataBlock::Altitude(_) => DataBlockSubtype::Altitude,
            DataBlock::Acceleration(_) => DataBlockSubtype::Acceleration,
            DataBlock::AngularVelocity(_) => DataBlockSubtype::AngularVelocity,
            DataBlock::GnssLocation(_) => DataBlockSubtype::GnssLocation,
            DataBlock::GnssMetadata(_) => DataBlockSubtype::GnssMetadata,
            DataBlock::Imu(_) => DataBlockSubtype::Imu,
        }
    }

    pub fn mission_time(&self) -> u32 {
        match self {
            DataBlock::DebugMessage(block) => block.mission_time,
            DataBlock::Status(block) => block.mission_time,
            DataBlock::Altitude(block) => block.mission_time,
            DataBlock::Acceleration(block) | DataBlock::AngularVelocity(block) => {
                block.mission_time
            }
            DataBlock::GnssLocation(block) => block.mission_time,
            DataBlock::GnssMetadata(block) => block.mission_time,
            DataBlock::Imu(block) => block.mission_time,
        }
    }

    /// Snapshot key for this block.
    pub fn name(&self) -> &'static str {
        self.subtype().name()
    }
}
