//! Container envelope
//!
//! `'JCO1' || u32 headerLen || headerBytes || u32 crc32(body) || body`,
//! all integers little-endian. The CRC covers exactly the body bytes and is
//! verified before any byte of the body is handed to the caller.

use crate::checksum::{compute_crc32, verify_crc32};
use crate::constants::CONTAINER_MAGIC;
use crate::error::{JcoError, Result};
use crate::header::ContainerHeader;

/// Wrap a body in the container envelope.
pub fn wrap(header: &ContainerHeader, body: &[u8]) -> Result<Vec<u8>> {
    let header_bytes = header.to_bytes()?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| JcoError::Internal("header exceeds u32 length".to_string()))?;

    let mut out = Vec::with_capacity(4 + 4 + header_bytes.len() + 4 + body.len());
    out.extend_from_slice(&CONTAINER_MAGIC);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&compute_crc32(body).to_le_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Unwrap a container, returning the parsed header and the verified body.
pub fn unwrap(bytes: &[u8]) -> Result<(ContainerHeader, &[u8])> {
    if bytes.len() < 8 {
        return Err(JcoError::ContainerCorrupt(
            "shorter than magic and header length".to_string(),
        ));
    }
    if bytes[0..4] != CONTAINER_MAGIC {
        return Err(JcoError::ContainerCorrupt("bad magic".to_string()));
    }

    let header_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_end = 8usize
        .checked_add(header_len)
        .ok_or_else(|| JcoError::ContainerCorrupt("header length overflow".to_string()))?;
    if header_end + 4 > bytes.len() {
        return Err(JcoError::ContainerCorrupt("truncated header".to_string()));
    }

    let header = ContainerHeader::from_bytes(&bytes[8..header_end])?;

    let crc = u32::from_le_bytes([
        bytes[header_end],
        bytes[header_end + 1],
        bytes[header_end + 2],
        bytes[header_end + 3],
    ]);
    let body = &bytes[header_end + 4..];
    verify_crc32(body, crc)?;

    Ok((header, body))
}
