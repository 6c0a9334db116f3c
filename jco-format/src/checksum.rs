//! CRC32 (IEEE 802.3) checksum over container bodies

use crate::error::{JcoError, Result};

/// Compute the IEEE CRC32 of `data`.
pub fn compute_crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verify the IEEE CRC32 of `data` against `expected`.
pub fn verify_crc32(data: &[u8], expected: u32) -> Result<()> {
    let actual = compute_crc32(data);
    if actual == expected {
        Ok(())
    } else {
        Err(JcoError::ContainerCorrupt(format!(
            "body CRC mismatch: stored {expected:#010x}, computed {actual:#010x}"
        )))
    }
}
