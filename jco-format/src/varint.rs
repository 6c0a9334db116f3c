//! Variable-length integer encoding (LEB128 / ZigZag)
//!
//! Two widths share the 7-bit-group scheme: u32 varints (five bytes at most)
//! carry every length and count prefix in the format, while u64 varints (ten
//! bytes at most) carry the integer column value streams, whose signed
//! 53-bit domain exceeds u32 after the `zz(v)+1` null-sentinel mapping.

use crate::error::{JcoError, Result};
use smallvec::SmallVec;

/// Encode a u32 as LEB128.
pub fn encode_varu32(val: u32) -> SmallVec<[u8; 5]> {
    let mut result = SmallVec::new();
    let mut x = val;

    while x >= 0x80 {
        result.push((x & 0x7F) as u8 | 0x80);
        x >>= 7;
    }
    result.push((x & 0x7F) as u8);

    result
}

/// Decode a LEB128 u32, returning the value and the bytes consumed.
pub fn decode_varu32(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut result = 0u32;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= 5 {
            return Err(JcoError::FrameCorrupt("varint overflow".to_string()));
        }
        if i == 4 && byte & 0xF0 != 0 {
            return Err(JcoError::FrameCorrupt("varint overflow".to_string()));
        }

        result |= ((byte & 0x7F) as u32) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(JcoError::FrameCorrupt("varint truncated".to_string()))
}

/// Encode a u64 as LEB128.
pub fn encode_varu64(val: u64) -> SmallVec<[u8; 10]> {
    let mut result = SmallVec::new();
    let mut x = val;

    while x >= 0x80 {
        result.push((x & 0x7F) as u8 | 0x80);
        x >>= 7;
    }
    result.push((x & 0x7F) as u8);

    result
}

/// Decode a LEB128 u64, returning the value and the bytes consumed.
pub fn decode_varu64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= 10 {
            return Err(JcoError::FrameCorrupt("varint overflow".to_string()));
        }
        if i == 9 && byte & 0xFE != 0 {
            return Err(JcoError::FrameCorrupt("varint overflow".to_string()));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(JcoError::FrameCorrupt("varint truncated".to_string()))
}

/// ZigZag encode a signed integer.
pub fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

/// ZigZag decode to a signed integer.
pub fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

/// Encode an optional integer under the column null-sentinel convention:
/// `zz(v)+1` for values, the reserved `0` for null.
pub fn encode_nullable_int(v: Option<i64>) -> SmallVec<[u8; 10]> {
    match v {
        Some(value) => encode_varu64(zigzag_encode(value) + 1),
        None => encode_varu64(0),
    }
}

/// Decode a null-sentinel integer, returning the value and bytes consumed.
pub fn decode_nullable_int(bytes: &[u8]) -> Result<(Option<i64>, usize)> {
    let (raw, consumed) = decode_varu64(bytes)?;
    if raw == 0 {
        Ok((None, consumed))
    } else {
        Ok((Some(zigzag_decode(raw - 1)), consumed))
    }
}
