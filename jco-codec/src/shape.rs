//! Columnar front-end
//!
//! Splits NDJSON input into lines, groups parsed records by shape
//! fingerprint, and emits the line-presence frame followed by one shape
//! frame per batch of at most 4096 rows. Blank and unparseable lines keep
//! their positions through the global line-presence bitmap. Tiny or
//! heterogeneous inputs decline the columnar path so the caller can use the
//! row-wise encoding instead.

use crate::column::encode_column;
use ahash::AHashMap;
use jco_format::bitmap::Bitmap;
use jco_format::constants::{
    COLUMNAR_MIN_BYTES, COLUMNAR_MIN_RECORDS, FRAME_SEPARATOR, MAX_ROWS_PER_FRAME,
};
use jco_format::frame::{encode_line_presence, encode_shape_frame};
use jco_format::{Result, ShapeFingerprint};
use serde_json::{Map, Value};
use smallvec::SmallVec;

/// Split text into lines on `\r?\n`, stripping a leading UTF-8 BOM.
///
/// A trailing newline yields a final empty segment, so joining the decoded
/// lines with `\n` restores it.
pub fn split_lines(text: &str) -> Vec<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

struct ShapeGroup {
    fingerprint: ShapeFingerprint,
    keys: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

/// Outcome of the columnar front-end.
pub enum ColumnarOutcome {
    /// The encoded frame sequence, ready for the back-end selector.
    Encoded(Vec<u8>),
    /// The input was too small or too heterogeneous for columns.
    Declined,
}

/// Run the columnar front-end over NDJSON text.
pub fn encode_columnar(text: &str) -> Result<ColumnarOutcome> {
    let lines = split_lines(text);

    let mut groups: Vec<ShapeGroup> = Vec::new();
    let mut by_id: AHashMap<u64, SmallVec<[usize; 2]>> = AHashMap::new();
    let mut line_bits = Vec::with_capacity(lines.len());
    let mut valid_records = 0usize;

    for line in &lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            line_bits.push(false);
            continue;
        }
        match serde_json::from_str::<Map<String, Value>>(trimmed) {
            Ok(record) => {
                line_bits.push(true);
                valid_records += 1;
                push_record(&mut groups, &mut by_id, record);
            }
            Err(_) => {
                // The line's position survives; its content does not.
                line_bits.push(false);
            }
        }
    }

    if valid_records < COLUMNAR_MIN_RECORDS || text.len() < COLUMNAR_MIN_BYTES {
        log::debug!(
            "columnar path declined: {valid_records} records, {} input bytes",
            text.len()
        );
        return Ok(ColumnarOutcome::Declined);
    }

    let mut body = encode_line_presence(&Bitmap::from_bools(&line_bits));
    for group in &groups {
        for batch in group.rows.chunks(MAX_ROWS_PER_FRAME) {
            body.push(FRAME_SEPARATOR);
            body.extend_from_slice(&encode_batch(group, batch)?);
        }
    }
    Ok(ColumnarOutcome::Encoded(body))
}

fn push_record(
    groups: &mut Vec<ShapeGroup>,
    by_id: &mut AHashMap<u64, SmallVec<[usize; 2]>>,
    record: Map<String, Value>,
) {
    // serde_json's map iterates in sorted key order, which is exactly the
    // shape's canonical order.
    let fingerprint = ShapeFingerprint::from_sorted_keys(record.keys());

    let candidates = by_id.entry(fingerprint.id).or_default();
    for &idx in candidates.iter() {
        if groups[idx].fingerprint.canonical == fingerprint.canonical {
            groups[idx].rows.push(record);
            return;
        }
    }

    // New shape, or an FNV collision that splits into its own group.
    let keys = record.keys().cloned().collect();
    let idx = groups.len();
    candidates.push(idx);
    groups.push(ShapeGroup {
        fingerprint,
        keys,
        rows: vec![record],
    });
}

fn encode_batch(group: &ShapeGroup, batch: &[Map<String, Value>]) -> Result<Vec<u8>> {
    let key_count = group.keys.len();
    let mut presence = Bitmap::new(batch.len() * key_count);
    let mut columns = Vec::with_capacity(key_count);

    for (k, key) in group.keys.iter().enumerate() {
        let mut slots = Vec::with_capacity(batch.len());
        for (row, record) in batch.iter().enumerate() {
            match record.get(key) {
                Some(value) => {
                    presence.set(row * key_count + k, true);
                    slots.push(Some(value.clone()));
                }
                None => slots.push(None),
            }
        }
        columns.push(encode_column(&slots)?);
    }

    encode_shape_frame(
        group.fingerprint.id,
        &group.keys,
        batch.len() as u32,
        &presence,
        &columns,
    )
}
