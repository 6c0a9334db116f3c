//! Row-wise line-preserving path
//!
//! The fallback for inputs the columnar front-end declines, and the path
//! chosen when the caller disables columns. Every line keeps its position:
//! JSON lines are canonicalised to compact text, blank lines are
//! normalised to empty (as on the columnar path), and unparseable lines
//! pass through verbatim.

use crate::shape::split_lines;
use serde_json::{Map, Value};

/// Canonicalise NDJSON text line by line.
pub fn encode_rowwise(text: &str) -> String {
    let lines: Vec<String> = split_lines(text)
        .into_iter()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => value.to_string(),
                Err(_) => line.to_string(),
            }
        })
        .collect();
    lines.join("\n")
}

/// Project row-wise NDJSON text onto a field set.
///
/// Object lines are reduced to the requested keys; blank lines stay blank
/// and non-object lines pass through unchanged.
pub fn project_rowwise(text: &str, fields: &[String]) -> String {
    let lines: Vec<String> = split_lines(text)
        .into_iter()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            match serde_json::from_str::<Map<String, Value>>(trimmed) {
                Ok(record) => {
                    let mut projected = Map::new();
                    for field in fields {
                        if let Some(value) = record.get(field) {
                            projected.insert(field.clone(), value.clone());
                        }
                    }
                    Value::Object(projected).to_string()
                }
                Err(_) => line.to_string(),
            }
        })
        .collect();
    lines.join("\n")
}
