//! Single-document canonicalisation
//!
//! The whole-JSON path parses the document, sorts object keys recursively
//! (serde_json's ordered map does this on parse), and reserialises to
//! compact text. Array order and number forms follow the host printer.

use jco_format::{JcoError, Result};
use serde_json::Value;

/// Canonicalise one JSON document to compact text.
pub fn canonicalize_document(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| JcoError::InputInvalid(format!("document is not valid JSON: {e}")))?;
    Ok(value.to_string())
}
