//! Shape fingerprints
//!
//! A record's shape is its sorted key list. The canonical serialisation
//! joins the sorted keys with U+0001 and the shape id is the FNV-1a 64 hash
//! of that serialisation. The id is paired with the literal key list so hash
//! collisions split into separate groups instead of merging shapes.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64 over raw bytes.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A shape's id together with its canonical key-list serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeFingerprint {
    /// FNV-1a 64 of the canonical serialisation.
    pub id: u64,
    /// Sorted keys joined with U+0001.
    pub canonical: String,
}

impl ShapeFingerprint {
    /// Fingerprint a sorted key list.
    pub fn from_sorted_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = String::new();
        let mut first = true;
        for key in keys {
            if !first {
                canonical.push('\u{0001}');
            }
            first = false;
            canonical.push_str(key.as_ref());
        }
        let id = fnv1a64(canonical.as_bytes());
        Self { id, canonical }
    }
}
