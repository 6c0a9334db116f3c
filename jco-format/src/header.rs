//! Container header
//!
//! The header is a UTF-8 JSON document describing the payload: format
//! version, the back-end that produced the body, creation time, and whether
//! the payload is NDJSON. Unknown fields are tolerated for forward
//! compatibility.

use crate::constants::FORMAT_VERSION;
use crate::error::{JcoError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed container header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Format version; currently 1.
    pub version: u32,
    /// Name of the back-end that produced the body.
    pub codec: String,
    /// ISO-8601 creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// True when the body carries an NDJSON payload.
    pub ndjson: bool,
    /// Reserved for externalised key dictionaries; false in this version.
    #[serde(rename = "keyDictInline", default)]
    pub key_dict_inline: bool,
    /// Opaque pass-through options.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ContainerHeader {
    /// Create a header for the given codec name.
    pub fn new(codec: impl Into<String>, ndjson: bool) -> Self {
        Self {
            version: FORMAT_VERSION,
            codec: codec.into(),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ndjson,
            key_dict_inline: false,
            options: Map::new(),
        }
    }

    /// Serialize to UTF-8 JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| JcoError::Internal(format!("header serialisation failed: {e}")))
    }

    /// Parse from UTF-8 JSON bytes, checking the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: ContainerHeader = serde_json::from_slice(bytes)
            .map_err(|e| JcoError::HeaderInvalid(format!("header is not valid JSON: {e}")))?;
        if header.version != FORMAT_VERSION {
            return Err(JcoError::HeaderInvalid(format!(
                "unsupported version {}",
                header.version
            )));
        }
        Ok(header)
    }
}
