//! Columnar selective decoder
//!
//! Walks the frame sequence, opens typed readers only for requested fields
//! (skipping other column payloads by their length prefixes), and
//! reconstructs the line stream from the global line-presence bitmap: a
//! 0-bit restores an empty line, a 1-bit takes the next row of the next
//! pending shape frame.

use crate::column_read::ColumnReader;
use jco_format::constants::LINE_PRESENCE_MAGIC;
use jco_format::frame::{FrameRef, FrameWalker};
use jco_format::{Bitmap, JcoError, Limits, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// True when the body leads with the columnar frame magic.
pub fn is_columnar(body: &[u8]) -> bool {
    body.len() >= 2 && body[0..2] == LINE_PRESENCE_MAGIC
}

struct DecodedFrame {
    rows: usize,
    keys: Vec<String>,
    presence: Bitmap,
    /// One reader per key; `None` for columns outside the requested set.
    readers: Vec<Option<ColumnReader>>,
}

/// Decode a columnar body back to NDJSON text.
///
/// With `fields` absent or empty a full decode over all keys is performed;
/// otherwise only the requested columns are opened and every emitted object
/// is restricted to that set.
pub fn decode_columnar(body: &[u8], fields: Option<&[String]>, limits: &Limits) -> Result<String> {
    let requested: Option<HashSet<&str>> = match fields {
        Some(names) if !names.is_empty() => Some(names.iter().map(String::as_str).collect()),
        _ => None,
    };

    let mut walker = FrameWalker::new(body, limits);
    let line_presence = match walker.next() {
        Some(Ok(FrameRef::LinePresence(frame))) => frame,
        Some(Ok(FrameRef::Shape(_))) => {
            return Err(JcoError::FrameCorrupt(
                "line-presence frame must come first".to_string(),
            ))
        }
        Some(Err(e)) => return Err(e),
        None => {
            return Err(JcoError::FrameCorrupt(
                "body contains no frames".to_string(),
            ))
        }
    };
    let line_count = line_presence.line_count as usize;
    let line_bits = line_presence.bitmap();

    let mut frames = Vec::new();
    let mut total_rows = 0usize;
    for frame in walker {
        match frame? {
            FrameRef::Shape(frame) => {
                let rows = frame.rows as usize;
                total_rows += rows;

                let mut readers = Vec::with_capacity(frame.keys.len());
                for (k, column) in frame.columns.iter().enumerate() {
                    let wanted = requested
                        .as_ref()
                        .map(|set| set.contains(frame.keys[k].as_str()))
                        .unwrap_or(true);
                    if wanted {
                        readers.push(Some(ColumnReader::decode(column, rows, limits)?));
                    } else {
                        readers.push(None);
                    }
                }

                frames.push(DecodedFrame {
                    rows,
                    presence: frame.presence_bitmap(),
                    keys: frame.keys,
                    readers,
                });
            }
            FrameRef::LinePresence(_) => {
                return Err(JcoError::FrameCorrupt(
                    "duplicate line-presence frame".to_string(),
                ))
            }
        }
    }

    if total_rows != line_bits.count_ones() {
        return Err(JcoError::FrameCorrupt(format!(
            "{total_rows} frame rows for {} present lines",
            line_bits.count_ones()
        )));
    }

    let mut out_lines = Vec::with_capacity(line_count);
    let mut frame_idx = 0usize;
    let mut row_idx = 0usize;
    for line in 0..line_count {
        if !line_bits.get(line) {
            out_lines.push(String::new());
            continue;
        }

        while frame_idx < frames.len() && row_idx >= frames[frame_idx].rows {
            frame_idx += 1;
            row_idx = 0;
        }
        let frame = frames
            .get(frame_idx)
            .ok_or_else(|| JcoError::FrameCorrupt("ran out of frame rows".to_string()))?;

        out_lines.push(render_row(frame, row_idx)?);
        row_idx += 1;
    }

    Ok(out_lines.join("\n"))
}

fn render_row(frame: &DecodedFrame, row: usize) -> Result<String> {
    let key_count = frame.keys.len();
    let mut object = Map::new();
    for (k, key) in frame.keys.iter().enumerate() {
        let Some(reader) = &frame.readers[k] else {
            continue;
        };
        if frame.presence.get(row * key_count + k) {
            object.insert(key.clone(), reader.value_at(row).unwrap_or(Value::Null));
        }
    }
    Ok(Value::Object(object).to_string())
}
