//! Decode-side security limits
//!
//! Enforced while parsing frames and hybrid envelopes to keep hostile inputs
//! from turning length prefixes into allocation bombs.

/// Security limits applied during decode.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum line count declared by a line-presence frame.
    pub max_lines: usize,
    /// Maximum rows declared by a shape frame.
    pub max_rows_per_frame: usize,
    /// Maximum keys declared by a shape frame.
    pub max_keys_per_frame: usize,
    /// Maximum byte length of a single key.
    pub max_key_bytes: usize,
    /// Maximum byte length of a single column payload.
    pub max_column_bytes: usize,
    /// Maximum byte length of a single RAW_JSON value.
    pub max_value_bytes: usize,
    /// Maximum windows in a hybrid envelope.
    pub max_windows: usize,
    /// Maximum uncompressed size of a single hybrid window.
    pub max_window_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_lines: 4 * 1024 * 1024,
            max_rows_per_frame: 1024 * 1024,
            max_keys_per_frame: 4_096,
            max_key_bytes: 64 * 1024,
            max_column_bytes: 256 * 1024 * 1024,
            max_value_bytes: 16 * 1024 * 1024,
            max_windows: 1024 * 1024,
            max_window_bytes: 64 * 1024 * 1024,
        }
    }
}
