//! Block header codec
//!
//! Every block inside a transmission starts with a 4-byte header holding a little-endian
//! 32-bit word:
//!
//! ```text
//! bits  0-4   length      stored as length/4 - 1 (payload of 4..=128 bytes)
//! bit   5     signature   block carries a crypto signature
//! bits  6-9   type        0 control, 1 command, 2 data
//! bits 10-15  subtype     payload schema within the type
//! bits 16-19  destination 0 ground station, 1 rocket
//! ```

use crate::{Result, TelemetryError};
use serde::Serialize;

/// Size of an encoded block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 4;

/// Largest payload a block header can declare.
pub const MAX_BLOCK_LENGTH: usize = 128;

/// Kind of block, from the 4-bit type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Control,
    Command,
    Data,
    /// Any type value the protocol does not assign.
    Reserved(u8),
}

impl BlockType {
    /// Map a raw 4-bit type value.
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0x0F {
            0 => BlockType::Control,
            1 => BlockType::Command,
            2 => BlockType::Data,
            other => BlockType::Reserved(other),
        }
    }

    /// Raw 4-bit value as written on the wire and in mission logs.
    pub fn raw(self) -> u8 {
        match self {
            BlockType::Control => 0,
            BlockType::Command => 1,
            BlockType::Data => 2,
            BlockType::Reserved(raw) => raw & 0x0F,
        }
    }
}

/// Decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    /// Payload length in bytes following the header.
    pub block_length: usize,
    pub has_signature: bool,
    pub block_type: BlockType,
    /// 6-bit subtype.
    pub block_subtype: u8,
    /// 4-bit destination address.
    pub destination_address: u8,
}

impl BlockHeader {
    /// Unpack a block header from the first four bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let word = bytes.get(..BLOCK_HEADER_SIZE).ok_or_else(|| {
            TelemetryError::malformed_header(format!(
                "block header needs {} bytes, got {}",
                BLOCK_HEADER_SIZE,
                bytes.len()
            ))
        })?;
        let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);

        Ok(Self {
            block_length: (((word & 0x1F) + 1) * 4) as usize,
            has_signature: (word >> 5) & 0x1 == 1,
            block_type: BlockType::from_raw(((word >> 6) & 0xF) as u8),
            block_subtype: ((word >> 10) & 0x3F) as u8,
            destination_address: ((word >> 16) & 0xF) as u8,
        })
    }

    /// Pack this header into its 4-byte wire form.
    ///
    /// Fails when a field does not fit its bit width or the length is not a multiple of
    /// four in `4..=128`.
    pub fn encode(&self) -> Result<[u8; BLOCK_HEADER_SIZE]> {
        if self.block_length == 0
            || self.block_length > MAX_BLOCK_LENGTH
            || self.block_length % 4 != 0
        {
            return Err(TelemetryError::malformed_header(format!(
                "block length {} is not a multiple of 4 in 4..={}",
                self.block_length, MAX_BLOCK_LENGTH
            )));
        }
        if self.block_subtype > 0x3F {
            return Err(TelemetryError::malformed_header(format!(
                "subtype {} exceeds 6 bits",
                self.block_subtype
            )));
        }
        if self.destination_address > 0x0F {
            return Err(TelemetryError::malformed_header(format!(
                "destination {} exceeds 4 bits",
                self.destination_address
            )));
        }

        let stored_length = (self.block_length / 4 - 1) as u32;
        let word = stored_length
            | (self.has_signature as u32) << 5
            | (self.block_type.raw() as u32) << 6
            | (self.block_subtype as u32) << 10
            | (self.destination_address as u32) << 16;

        Ok(word.to_le_bytes())
    }
}
