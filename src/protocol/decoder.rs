//! Data block decoder
//!
//! Maps a block's `(type, subtype, payload)` to what the coordinator should do with it.
//! DATA payloads are decoded from fixed little-endian layouts into [`DataBlock`]
//! variants. Values that look implausible still decode: judging them is fault
//! detection's job, not the decoder's.

use super::block_header::BlockType;
use crate::types::{
    AltitudeBlock, DataBlock, DataBlockSubtype, DebugMessageBlock, DeploymentState, FixType,
    GnssLocationBlock, GnssMetadataBlock, ImuBlock, SatelliteInfo, SensorStatus, StatusBlock,
    TriAxisBlock,
};
use crate::{Result, TelemetryError};

/// Outcome of decoding one block.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBlock {
    /// CONTROL block: the rocket asks for a signal report (SNR and RSSI).
    SignalReport,
    /// COMMAND block: acknowledged, carries nothing for the snapshot.
    CommandAck { subtype: u8 },
    Data(DataBlock),
}

/// Decode one block by type, subtype and payload.
pub fn decode_block(block_type: BlockType, subtype: u8, payload: &[u8]) -> Result<DecodedBlock> {
    match block_type {
        BlockType::Control => Ok(DecodedBlock::SignalReport),
        BlockType::Command => Ok(DecodedBlock::CommandAck { subtype }),
        BlockType::Data => decode_data_block(subtype, payload).map(DecodedBlock::Data),
        BlockType::Reserved(raw) => Err(TelemetryError::UnknownBlockType { block_type: raw }),
    }
}

/// Decode a DATA block payload for the given raw subtype.
pub fn decode_data_block(subtype: u8, payload: &[u8]) -> Result<DataBlock> {
    let subtype =
        DataBlockSubtype::from_raw(subtype).ok_or(TelemetryError::UnknownSubtype { subtype })?;
    let payload = Payload::new(subtype, payload)?;
    let mission_time = payload.u32(0)?;

    let block = match subtype {
        DataBlockSubtype::DebugMessage => DataBlock::DebugMessage(DebugMessageBlock {
            mission_time,
            message: String::from_utf8_lossy(payload.tail(4))
                .trim_end_matches('\0')
                .to_string(),
        }),
        DataBlockSubtype::Status => DataBlock::Status(StatusBlock {
            mission_time,
            kx134_state: SensorStatus::from_raw(payload.u8(4)?),
            altimeter_state: SensorStatus::from_raw(payload.u8(5)?),
            imu_state: SensorStatus::from_raw(payload.u8(6)?),
            sd_driver_state: SensorStatus::from_raw(payload.u8(7)?),
            gnss_state: SensorStatus::from_raw(payload.u8(8)?),
            deployment_state: DeploymentState::from_raw(payload.u8(9)?),
            sd_blocks_recorded: payload.u32(12)?,
            sd_checkouts_missed: payload.u32(16)?,
        }),
        DataBlockSubtype::Altitude => DataBlock::Altitude(AltitudeBlock {
            mission_time,
            pressure: payload.i32(4)?,
            temperature: payload.i32(8)? as f64 / 1000.0,
            altitude: payload.i32(12)? as f64 / 1000.0,
        }),
        DataBlockSubtype::Acceleration => DataBlock::Acceleration(tri_axis(&payload)?),
        DataBlockSubtype::AngularVelocity => DataBlock::AngularVelocity(tri_axis(&payload)?),
        DataBlockSubtype::GnssLocation => DataBlock::GnssLocation(GnssLocationBlock {
            mission_time,
            latitude: payload.i32(4)? as f64 / 600_000.0,
            longitude: payload.i32(8)? as f64 / 600_000.0,
            utc_time: payload.u32(12)?,
            altitude: payload.i32(16)? as f64 / 1000.0,
            speed: payload.i16(20)? as f64 / 100.0,
            course: payload.i16(22)? as f64 / 100.0,
            pdop: payload.u16(24)? as f64 / 100.0,
            hdop: payload.u16(26)? as f64 / 100.0,
            vdop: payload.u16(28)? as f64 / 100.0,
            sats: payload.u8(30)?,
            fix_type: FixType::from_raw(payload.u8(31)?),
        }),
        DataBlockSubtype::GnssMetadata => DataBlock::GnssMetadata(GnssMetadataBlock {
            mission_time,
            gps_sats_in_use: satellites_in_mask(payload.u32(4)?),
            glonass_sats_in_use: satellites_in_mask(payload.u32(8)?),
            sats_in_view: payload
                .tail(12)
                .chunks_exact(4)
                .map(|w| SatelliteInfo::from_word(u32::from_le_bytes([w[0], w[1], w[2], w[3]])))
                .collect(),
        }),
        DataBlockSubtype::Imu => DataBlock::Imu(ImuBlock {
            mission_time,
            accel_x: payload.i16(4)?,
            accel_y: payload.i16(6)?,
            accel_z: payload.i16(8)?,
            temperature: payload.i16(10)?,
            gyro_x: payload.i16(12)?,
            gyro_y: payload.i16(14)?,
            gyro_z: payload.i16(16)?,
            mag_x: payload.i16(18)?,
            mag_y: payload.i16(20)?,
            mag_z: payload.i16(22)?,
            mag_overflow: payload.u8(24)? & 0x08 != 0,
        }),
    };

    Ok(block)
}

fn tri_axis(payload: &Payload<'_>) -> Result<TriAxisBlock> {
    let fsr = payload.i16(4)?;
    let scale = fsr as f64 / 32768.0;
    Ok(TriAxisBlock {
        mission_time: payload.u32(0)?,
        fsr,
        x: payload.i16(6)? as f64 * scale,
        y: payload.i16(8)? as f64 * scale,
        z: payload.i16(10)? as f64 * scale,
    })
}

/// Satellite numbers (1-based) whose bit is set.
fn satellites_in_mask(mask: u32) -> Vec<u8> {
    (0..32u8).filter(|bit| mask & (1 << bit) != 0).map(|bit| bit + 1).collect()
}

/// Bounds-checked little-endian reads over a payload already checked against the
/// subtype's minimum length.
struct Payload<'a> {
    subtype: DataBlockSubtype,
    data: &'a [u8],
}

impl<'a> Payload<'a> {
    fn new(subtype: DataBlockSubtype, data: &'a [u8]) -> Result<Self> {
        let expected = subtype.min_payload_len();
        if data.len() < expected {
            return Err(TelemetryError::PayloadTooShort {
                subtype: subtype.name(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { subtype, data })
    }

    fn bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        self.data
            .get(offset..offset + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(TelemetryError::PayloadTooShort {
                subtype: self.subtype.name(),
                expected: offset + N,
                actual: self.data.len(),
            })
    }

    fn tail(&self, offset: usize) -> &'a [u8] {
        self.data.get(offset..).unwrap_or_default()
    }

    fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes::<1>(offset)?[0])
    }

    fn u16(&self, offset: usize) -> Result<u16> {
        self.bytes(offset).map(u16::from_le_bytes)
    }

    fn i16(&self, offset: usize) -> Result<i16> {
        self.bytes(offset).map(i16::from_le_bytes)
    }

    fn u32(&self, offset: usize) -> Result<u32> {
        self.bytes(offset).map(u32::from_le_bytes)
    }

    fn i32(&self, offset: usize) -> Result<i32> {
        self.bytes(offset).map(i32::from_le_bytes)
    }
}
