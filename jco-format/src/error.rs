//! Error types for the JCO format

use thiserror::Error;

/// JCO error kinds.
///
/// Decoding never attempts recovery: the first corruption detected is
/// surfaced with its kind and a short message, and no partial bytes are
/// returned to the caller.
#[derive(Debug, Error)]
pub enum JcoError {
    /// Bad container magic, short header, CRC mismatch, or truncated body.
    #[error("container corrupt: {0}")]
    ContainerCorrupt(String),
    /// Header JSON parse failure, unsupported version, or unknown codec.
    #[error("header invalid: {0}")]
    HeaderInvalid(String),
    /// An entropy back-end failed with no surviving alternative.
    #[error("backend failed: {0}")]
    BackendFailed(String),
    /// Bad frame magic, inconsistent length prefixes, unknown column type
    /// tag, enum id out of range, or varint overflow.
    #[error("frame corrupt: {0}")]
    FrameCorrupt(String),
    /// Encode-side input was not the text the operation required.
    #[error("input invalid: {0}")]
    InputInvalid(String),
    /// A decode-side security limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    /// I/O error from the surrounding reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, JcoError>;
