//! Transmission framing
//!
//! A transmission is a packet header followed by blocks concatenated without
//! delimiters. Framing walks the body by each block's declared length; it never
//! decodes payloads, so the raw blocks can be recorded before decoding is attempted.
//!
//! Framing is all-or-nothing: a block whose declared length runs past the end of the
//! transmission rejects the whole transmission.

use super::block_header::{BLOCK_HEADER_SIZE, BlockHeader, BlockType};
use super::decoder::{DecodedBlock, decode_block};
use super::hex;
use super::packet_header::{PACKET_HEADER_HEX_LEN, PacketHeader};
use crate::{Result, TelemetryError};
use std::str::FromStr;

/// One framed block: its header and exactly `block_length` payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub header: BlockHeader,
    pub payload: Vec<u8>,
}

impl RawBlock {
    pub fn decode(&self) -> Result<DecodedBlock> {
        decode_block(self.header.block_type, self.header.block_subtype, &self.payload)
    }

    /// The `(type, subtype, payload_hex)` form recorded in mission logs.
    pub fn to_triple(&self) -> BlockTriple {
        BlockTriple {
            block_type: self.header.block_type.raw(),
            block_subtype: self.header.block_subtype,
            payload_hex: hex::encode(&self.payload),
        }
    }
}

/// A framed transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub header: PacketHeader,
    pub blocks: Vec<RawBlock>,
}

impl Transmission {
    /// Frame a hex-encoded transmission as received from the radio.
    pub fn parse(transmission: &str) -> Result<Self> {
        let transmission = transmission.trim();
        let header = PacketHeader::decode_hex(transmission)?;

        if header.is_header_only() {
            return Ok(Self { header, blocks: Vec::new() });
        }

        let body = hex::decode(&transmission[PACKET_HEADER_HEX_LEN..])?;
        let blocks = frame_blocks(&body)?;
        Ok(Self { header, blocks })
    }

    /// Decode every block, failing on the first block that does not decode.
    pub fn decode_blocks(&self) -> Result<Vec<DecodedBlock>> {
        self.blocks.iter().map(RawBlock::decode).collect()
    }
}

/// Split a block buffer into raw blocks by declared lengths.
pub fn frame_blocks(mut body: &[u8]) -> Result<Vec<RawBlock>> {
    let mut blocks = Vec::new();

    while !body.is_empty() {
        let header = BlockHeader::decode(body)?;
        let end = BLOCK_HEADER_SIZE + header.block_length;
        let payload = body.get(BLOCK_HEADER_SIZE..end).ok_or(TelemetryError::BlockOverrun {
            declared: header.block_length,
            remaining: body.len() - BLOCK_HEADER_SIZE,
        })?;

        blocks.push(RawBlock { header, payload: payload.to_vec() });
        body = &body[end..];
    }

    Ok(blocks)
}

/// A block as recorded in a mission log line: `type,subtype,payload_hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTriple {
    pub block_type: u8,
    pub block_subtype: u8,
    pub payload_hex: String,
}

impl BlockTriple {
    pub fn new(block_type: BlockType, block_subtype: u8, payload: &[u8]) -> Self {
        Self { block_type: block_type.raw(), block_subtype, payload_hex: hex::encode(payload) }
    }

    /// Decode the recorded block through the same decoder the live path uses.
    pub fn decode(&self) -> Result<DecodedBlock> {
        let payload = hex::decode(&self.payload_hex)?;
        decode_block(BlockType::from_raw(self.block_type), self.block_subtype, &payload)
    }
}

impl std::fmt::Display for BlockTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.block_type, self.block_subtype, self.payload_hex)
    }
}

impl FromStr for BlockTriple {
    type Err = TelemetryError;

    fn from_str(line: &str) -> Result<Self> {
        let mut fields = line.trim().splitn(3, ',');
        let (Some(block_type), Some(block_subtype), Some(payload_hex)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(TelemetryError::mission_log(0, format!("expected 3 fields in {:?}", line)));
        };

        let block_type = block_type.trim().parse::<u8>().map_err(|e| {
            TelemetryError::mission_log(0, format!("invalid block type {:?}: {}", block_type, e))
        })?;
        let block_subtype = block_subtype.trim().parse::<u8>().map_err(|e| {
            TelemetryError::mission_log(0, format!("invalid subtype {:?}: {}", block_subtype, e))
        })?;

        Ok(Self { block_type, block_subtype, payload_hex: payload_hex.trim().to_string() })
    }
}
