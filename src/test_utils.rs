//! Test utilities for building synthetic radio traffic
//!
//! This module provides builders for payloads, blocks and complete hex transmissions so
//! tests and benchmarks can exercise the decode pipeline without a radio.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::{BlockHeader, BlockType, CallSign, PacketHeader, hex};
use crate::types::DataBlockSubtype;

/// Call sign used by synthetic transmissions.
///
/// Its last character has both low bits clear, so it survives the bits it shares with
/// the packet length field for packets up to 64 bytes.
pub const TEST_CALL_SIGN: &str = "ROCKET";

/// Payload builders matching the fixed layouts of each data block subtype.
pub mod payloads {
    fn padded(mut payload: Vec<u8>) -> Vec<u8> {
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        payload
    }

    pub fn debug_message(mission_time: u32, message: &str) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        payload.extend_from_slice(message.as_bytes());
        padded(payload)
    }

    /// Status block with every sensor set to `sensor_state`.
    pub fn status(mission_time: u32, sensor_state: u8, deployment_state: u8) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        payload.extend_from_slice(&[sensor_state; 5]);
        payload.push(deployment_state);
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(&128u32.to_le_bytes());
        payload.extend_from_slice(&3u32.to_le_bytes());
        payload
    }

    pub fn altitude(mission_time: u32, pressure: i32, temperature_mc: i32, altitude_mm: i32) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        payload.extend_from_slice(&pressure.to_le_bytes());
        payload.extend_from_slice(&temperature_mc.to_le_bytes());
        payload.extend_from_slice(&altitude_mm.to_le_bytes());
        payload
    }

    /// Acceleration or angular velocity payload.
    pub fn tri_axis(mission_time: u32, fsr: i16, x: i16, y: i16, z: i16) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        for value in [fsr, x, y, z] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload
    }

    pub fn gnss_location(
        mission_time: u32,
        latitude: f64,
        longitude: f64,
        altitude_mm: i32,
        sats: u8,
        fix_type: u8,
    ) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        payload.extend_from_slice(&((latitude * 600_000.0).round() as i32).to_le_bytes());
        payload.extend_from_slice(&((longitude * 600_000.0).round() as i32).to_le_bytes());
        payload.extend_from_slice(&123_456u32.to_le_bytes());
        payload.extend_from_slice(&altitude_mm.to_le_bytes());
        payload.extend_from_slice(&1_250i16.to_le_bytes());
        payload.extend_from_slice(&9_000i16.to_le_bytes());
        for dop in [150u16, 90, 120] {
            payload.extend_from_slice(&dop.to_le_bytes());
        }
        payload.push(sats);
        payload.push(fix_type);
        payload
    }

    pub fn imu(mission_time: u32, accel: [i16; 3], gyro: [i16; 3], mag: [i16; 3]) -> Vec<u8> {
        let mut payload = mission_time.to_le_bytes().to_vec();
        for value in accel {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.extend_from_slice(&2_500i16.to_le_bytes());
        for value in gyro.into_iter().chain(mag) {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.extend_from_slice(&[0, 0]);
        padded(payload)
    }
}

/// Encode a block (header plus payload). The payload is zero-padded to a multiple of 4.
pub fn block(block_type: BlockType, subtype: u8, payload: &[u8]) -> Vec<u8> {
    let mut payload = payload.to_vec();
    while payload.len() % 4 != 0 || payload.is_empty() {
        payload.push(0);
    }

    let header = BlockHeader {
        block_length: payload.len(),
        has_signature: false,
        block_type,
        block_subtype: subtype,
        destination_address: 0,
    };

    let mut bytes = header.encode().expect("test block payloads must fit a block header").to_vec();
    bytes.extend_from_slice(&payload);
    bytes
}

/// Encode a DATA block of the given subtype.
pub fn data_block(subtype: DataBlockSubtype, payload: &[u8]) -> Vec<u8> {
    block(BlockType::Data, subtype.raw(), payload)
}

/// Encode a complete transmission as the radio's hex string.
///
/// The declared length is rounded up to the next multiple of 4 so bodies with a trailing
/// fragment still get an encodable header.
pub fn transmission(packet_number: u16, blocks: &[Vec<u8>]) -> String {
    let body: Vec<u8> = blocks.concat();
    let total_length = (12 + body.len()).next_multiple_of(4).min(256);

    let header = PacketHeader {
        call_sign: CallSign::from_text(TEST_CALL_SIGN),
        total_length,
        protocol_version: 1,
        source_address: 1,
        packet_number,
    };

    let mut bytes = header.encode().expect("test packet header must encode").to_vec();
    bytes.extend_from_slice(&body);
    hex::encode(&bytes)
}

/// A transmission consisting of only the packet header.
pub fn header_only_transmission(packet_number: u16) -> String {
    transmission(packet_number, &[])
}
