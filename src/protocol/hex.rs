//! ASCII hex conversion for radio transmissions and mission logs.

use crate::{Result, TelemetryError};
use std::fmt::Write;

/// Decode an ASCII hex string into bytes. Both letter cases are accepted.
pub fn decode(hex: &str) -> Result<Vec<u8>> {
    let digits = hex.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(TelemetryError::InvalidHex {
            position: digits.len(),
            details: "odd number of hex digits".to_string(),
        });
    }

    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let high = nibble(pair[0], i * 2)?;
            let low = nibble(pair[1], i * 2 + 1)?;
            Ok((high << 4) | low)
        })
        .collect()
}

/// Encode bytes as uppercase ASCII hex, the form the radio emits.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

fn nibble(digit: u8, position: usize) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(TelemetryError::InvalidHex {
            position,
            details: format!("unexpected character {:?}", digit as char),
        }),
    }
}
