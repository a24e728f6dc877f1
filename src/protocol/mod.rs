//! Radio wire protocol
//!
//! Transmissions arrive from the ground radio as ASCII hex. Each one is a 12-byte
//! [`PacketHeader`] followed by length-prefixed blocks, each with a 4-byte
//! [`BlockHeader`]. [`Transmission::parse`] frames the blocks and
//! [`decode_block`] turns each into a [`DecodedBlock`].
//!
//! ```rust
//! use groundstation::protocol::{BlockHeader, BlockType};
//!
//! let header = BlockHeader::decode(&[0x84, 0x0C, 0x00, 0x00])?;
//! assert_eq!(header.block_type, BlockType::Data);
//! assert_eq!(header.block_length, 20);
//! assert_eq!(header.encode()?, [0x84, 0x0C, 0x00, 0x00]);
//! # Ok::<(), groundstation::TelemetryError>(())
//! ```

pub mod block_header;
pub mod decoder;
pub mod frame;
pub mod hex;
pub mod packet_header;

pub use block_header::{BLOCK_HEADER_SIZE, BlockHeader, BlockType, MAX_BLOCK_LENGTH};
pub use decoder::{DecodedBlock, decode_block, decode_data_block};
pub use frame::{BlockTriple, RawBlock, Transmission, frame_blocks};
pub use packet_header::{CallSign, PACKET_HEADER_HEX_LEN, PACKET_HEADER_SIZE, PacketHeader};
