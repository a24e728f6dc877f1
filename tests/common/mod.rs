//! Flight fixture for integration tests

use groundstation::protocol::{BlockHeader, BlockType, CallSign, PacketHeader, hex};
use groundstation::types::DataBlockSubtype;

fn data_block(subtype: DataBlockSubtype, fields: &[&[u8]]) -> Vec<u8> {
    let payload = fields.concat();
    let header = BlockHeader {
        block_length: payload.len(),
        has_signature: false,
        block_type: BlockType::Data,
        block_subtype: subtype.raw(),
        destination_address: 0,
    };
    let mut bytes = header.encode().unwrap().to_vec();
    bytes.extend_from_slice(&payload);
    bytes
}

fn transmission(packet_number: u16, blocks: &[Vec<u8>]) -> String {
    let body = blocks.concat();
    let header = PacketHeader {
        call_sign: CallSign::from_text("ROCKET"),
        total_length: 12 + body.len(),
        protocol_version: 1,
        source_address: 1,
        packet_number,
    };
    let mut bytes = header.encode().unwrap().to_vec();
    bytes.extend_from_slice(&body);
    hex::encode(&bytes)
}

/// A short flight: status, then climbing altitude and acceleration samples.
pub fn flight(samples: u32) -> Vec<String> {
    (0..samples)
        .map(|i| {
            let time = i * 100;
            let deployment_state: u8 = if i < samples / 2 { 2 } else { 3 };
            let altitude_mm = (i as i32) * 15_000;
            let z = 2_048 - i as i16;

            let status = data_block(DataBlockSubtype::Status, &[
                &time.to_le_bytes(),
                &[2; 5],
                &[deployment_state, 0, 0],
                &64u32.to_le_bytes(),
                &0u32.to_le_bytes(),
            ]);
            let altitude = data_block(DataBlockSubtype::Altitude, &[
                &(time + 10).to_le_bytes(),
                &101_325i32.to_le_bytes(),
                &18_250i32.to_le_bytes(),
                &altitude_mm.to_le_bytes(),
            ]);
            let acceleration = data_block(DataBlockSubtype::Acceleration, &[
                &(time + 20).to_le_bytes(),
                &16i16.to_le_bytes(),
                &0i16.to_le_bytes(),
                &0i16.to_le_bytes(),
                &z.to_le_bytes(),
            ]);
            transmission(i as u16, &[status, altitude, acceleration])
        })
        .collect()
}
