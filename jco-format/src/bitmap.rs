//! Bit-packed bitmaps for presence tracking
//!
//! Row-major, LSB-first within each byte. The bit length is carried
//! separately on the wire; trailing pad bits are zero.

use bitvec::prelude::*;

/// A compact bit vector backed by a contiguous byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: BitVec<u8, Lsb0>,
}

impl Bitmap {
    /// Create a bitmap of `len` zero bits.
    pub fn new(len: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, len),
        }
    }

    /// Set bit `idx`.
    pub fn set(&mut self, idx: usize, value: bool) {
        if idx < self.bits.len() {
            self.bits.set(idx, value);
        }
    }

    /// Read bit `idx`; out-of-range reads are zero.
    pub fn get(&self, idx: usize) -> bool {
        self.bits.get(idx).map(|b| *b).unwrap_or(false)
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when the bitmap holds no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Count of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Serialize to `ceil(len/8)` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.as_raw_slice().to_vec()
    }

    /// Deserialize from bytes, truncating to `len` bits.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let mut bits = BitVec::<u8, Lsb0>::from_slice(bytes);
        bits.truncate(len);
        Self { bits }
    }

    /// Build from boolean values.
    pub fn from_bools(bools: &[bool]) -> Self {
        let mut bits = BitVec::<u8, Lsb0>::new();
        for &b in bools {
            bits.push(b);
        }
        Self { bits }
    }
}

/// Bytes needed to hold `bits` bits.
pub fn byte_len(bits: usize) -> usize {
    (bits + 7) / 8
}
