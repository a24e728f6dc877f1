//! Packet header codec
//!
//! A transmission starts with a 12-byte (24 hex character) packet header. The first six
//! bytes are the transmitter call sign. The remaining fields are read from a big-endian
//! view of the full 96-bit header at fixed bit positions, counted from the most
//! significant bit starting at 0:
//!
//! | Field          | Bits        | Meaning                          |
//! |----------------|-------------|----------------------------------|
//! | length         | `[46, 52)`  | total packet length `(raw+1)*4`  |
//! | version        | `[52, 57)`  | protocol version                 |
//! | source address | `[62, 66)`  | transmitting device              |
//! | packet number  | `[66, 78)`  | rolling sequence number          |
//!
//! The length field shares its two high bits with the two low bits of the last call
//! sign character.

use super::hex;
use crate::{Result, TelemetryError};
use serde::{Serialize, Serializer};

/// Size of the packet header in bytes.
pub const PACKET_HEADER_SIZE: usize = 12;

/// Size of the packet header in hex characters.
pub const PACKET_HEADER_HEX_LEN: usize = PACKET_HEADER_SIZE * 2;

/// Packets whose declared length is at most this carry no blocks.
pub const HEADER_ONLY_LENGTH: usize = 24;

const HEADER_BITS: u32 = (PACKET_HEADER_SIZE * 8) as u32;
const LENGTH_BITS: (u32, u32) = (46, 52);
const VERSION_BITS: (u32, u32) = (52, 57);
const SOURCE_BITS: (u32, u32) = (62, 66);
const PACKET_NUMBER_BITS: (u32, u32) = (66, 78);

/// Transmitter call sign, kept as the raw six header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CallSign(pub [u8; 6]);

impl CallSign {
    /// Build a call sign from text, padding with spaces and truncating to six bytes.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [b' '; 6];
        for (slot, byte) in bytes.iter_mut().zip(text.bytes()) {
            *slot = byte;
        }
        Self(bytes)
    }

    /// Raw header bytes.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Text form used on the live path. Invalid UTF-8 is replaced, padding trimmed.
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.0).trim_end_matches(['\0', ' ']).to_string()
    }
}

impl std::fmt::Display for CallSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for CallSign {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketHeader {
    pub call_sign: CallSign,
    /// Declared packet length in bytes, header included.
    pub total_length: usize,
    pub protocol_version: u8,
    pub source_address: u8,
    pub packet_number: u16,
}

impl PacketHeader {
    /// Decode a packet header from the leading 24 hex characters of a transmission.
    pub fn decode_hex(transmission: &str) -> Result<Self> {
        let header = transmission
            .get(..PACKET_HEADER_HEX_LEN)
            .ok_or(TelemetryError::TruncatedPacket { length: transmission.len() })?;
        Self::decode(&hex::decode(header)?)
    }

    /// Decode a packet header from its 12 raw bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes
            .get(..PACKET_HEADER_SIZE)
            .ok_or(TelemetryError::TruncatedPacket { length: bytes.len() * 2 })?;

        let word = bytes.iter().fold(0u128, |acc, byte| (acc << 8) | *byte as u128);

        let mut call_sign = [0u8; 6];
        call_sign.copy_from_slice(&bytes[..6]);

        Ok(Self {
            call_sign: CallSign(call_sign),
            total_length: (extract(word, LENGTH_BITS) as usize + 1) * 4,
            protocol_version: extract(word, VERSION_BITS) as u8,
            source_address: extract(word, SOURCE_BITS) as u8,
            packet_number: extract(word, PACKET_NUMBER_BITS) as u16,
        })
    }

    /// Encode this header into 12 bytes.
    ///
    /// Used to build synthetic transmissions. The length field is written after the call
    /// sign, so it wins where the two overlap.
    pub fn encode(&self) -> Result<[u8; PACKET_HEADER_SIZE]> {
        if self.total_length == 0 || self.total_length % 4 != 0 || self.total_length > 256 {
            return Err(TelemetryError::malformed_header(format!(
                "packet length {} is not a multiple of 4 in 4..=256",
                self.total_length
            )));
        }

        let mut word = self
            .call_sign
            .0
            .iter()
            .fold(0u128, |acc, byte| (acc << 8) | *byte as u128)
            << (HEADER_BITS - 48);

        word = insert(word, LENGTH_BITS, (self.total_length / 4 - 1) as u128);
        word = insert(word, VERSION_BITS, self.protocol_version as u128);
        word = insert(word, SOURCE_BITS, self.source_address as u128);
        word = insert(word, PACKET_NUMBER_BITS, self.packet_number as u128);

        let mut bytes = [0u8; PACKET_HEADER_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (word >> (HEADER_BITS - 8 * (i as u32 + 1))) as u8;
        }
        Ok(bytes)
    }

    /// Whether this packet is only a header with no blocks following.
    pub fn is_header_only(&self) -> bool {
        self.total_length <= HEADER_ONLY_LENGTH
    }
}

fn mask(bits: (u32, u32)) -> u128 {
    (1u128 << (bits.1 - bits.0)) - 1
}

fn extract(word: u128, bits: (u32, u32)) -> u128 {
    (word >> (HEADER_BITS - bits.1)) & mask(bits)
}

fn insert(word: u128, bits: (u32, u32), value: u128) -> u128 {
    let shift = HEADER_BITS - bits.1;
    (word & !(mask(bits) << shift)) | ((value & mask(bits)) << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(total_length: usize) -> PacketHeader {
        PacketHeader {
            call_sign: CallSign::from_text("ROCKET"),
            total_length,
            protocol_version: 1,
            source_address: 1,
            packet_number: 42,
        }
    }

    #[test]
    fn round_trips_through_hex() {
        let original = header(52);
        let encoded = hex::encode(&original.encode().unwrap());
        assert_eq!(encoded.len(), PACKET_HEADER_HEX_LEN);

        let decoded = PacketHeader::decode_hex(&encoded).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.call_sign.as_text(), "ROCKET");
    }

    #[test]
    fn fields_land_at_fixed_bit_positions() {
        // Byte 6 holds length bits 48..52 in its high nibble; bits 46..48 live in byte 5.
        let bytes = header(52).encode().unwrap();
        assert_eq!(bytes[6] >> 4, 12);
        // Packet number bits 66..78 sit inside bytes 8 and 9 (bits 64..80).
        let tail = ((bytes[8] as u16) << 8) | bytes[9] as u16;
        assert_eq!((tail >> 2) & 0xFFF, 42);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let result = PacketHeader::decode_hex("524F434B4554");
        assert!(matches!(result, Err(TelemetryError::TruncatedPacket { length: 12 })));
    }

    #[test]
    fn header_only_packets_are_detected() {
        assert!(header(24).is_header_only());
        assert!(header(12).is_header_only());
        assert!(!header(28).is_header_only());
    }

    #[test]
    fn call_sign_keeps_raw_bytes() {
        let mut bytes = header(20).encode().unwrap();
        bytes[0] = 0xFF;
        let decoded = PacketHeader::decode(&bytes).unwrap();
        assert_eq!(decoded.call_sign.as_bytes()[0], 0xFF);
        assert!(decoded.call_sign.as_text().starts_with('\u{FFFD}'));
    }
}
