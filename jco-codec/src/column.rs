//! Column encoders
//!
//! A column's encoded layout is `type_tag:u8 || payload`. Selection is
//! deterministic given the column's values: all-null columns fall back to
//! RAW_JSON, then ENUM_IDS, BOOL_RLE, DELTA_ZIGZAG, INT_VARINT are tried in
//! that order, with RAW_JSON as the final fallback for everything else.

use jco_format::constants::{
    BOOL_CODE_FALSE, BOOL_CODE_NULL, BOOL_CODE_TRUE, COLUMN_BOOL_RLE, COLUMN_DELTA_ZIGZAG,
    COLUMN_ENUM_IDS, COLUMN_INT_VARINT, COLUMN_RAW_JSON, COLUMN_STR_IDS_WITH_RESID,
    COLUMN_TIME_DOD, ENUM_MAX_DICT_ENTRIES, ENUM_MAX_STRING_BYTES, ENUM_NULL_ID, MAX_SAFE_INT,
};
use jco_format::varint::{encode_nullable_int, encode_varu32};
use jco_format::{JcoError, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// A row slot in a column: `None` when the row does not supply the key.
pub type ColumnSlot = Option<Value>;

/// Column type tags (stable wire values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Integers as nullable varints.
    IntVarint,
    /// Integers as zigzag deltas from the previous value.
    DeltaZigzag,
    /// Timestamps as delta-of-delta; decoded but never emitted.
    TimeDod,
    /// Booleans as run-length groups.
    BoolRle,
    /// Low-cardinality strings as dictionary ids.
    EnumIds,
    /// Length-prefixed JSON text fallback.
    RawJson,
}

impl ColumnType {
    /// Wire tag of this column type.
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::IntVarint => COLUMN_INT_VARINT,
            ColumnType::DeltaZigzag => COLUMN_DELTA_ZIGZAG,
            ColumnType::TimeDod => COLUMN_TIME_DOD,
            ColumnType::BoolRle => COLUMN_BOOL_RLE,
            ColumnType::EnumIds => COLUMN_ENUM_IDS,
            ColumnType::RawJson => COLUMN_RAW_JSON,
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            COLUMN_INT_VARINT => Ok(ColumnType::IntVarint),
            COLUMN_DELTA_ZIGZAG => Ok(ColumnType::DeltaZigzag),
            COLUMN_TIME_DOD => Ok(ColumnType::TimeDod),
            COLUMN_BOOL_RLE => Ok(ColumnType::BoolRle),
            COLUMN_ENUM_IDS => Ok(ColumnType::EnumIds),
            COLUMN_RAW_JSON => Ok(ColumnType::RawJson),
            COLUMN_STR_IDS_WITH_RESID => Err(JcoError::FrameCorrupt(
                "reserved column type tag 5".to_string(),
            )),
            other => Err(JcoError::FrameCorrupt(format!(
                "unknown column type tag {other}"
            ))),
        }
    }
}

/// Interpret a JSON value as a signed 53-bit integer.
///
/// Floats (including integral-valued ones that serde_json parsed as f64)
/// and magnitudes past 2^53-1 are rejected so RAW_JSON preserves their
/// exact text.
pub fn as_int53(value: &Value) -> Option<i64> {
    let n = value.as_i64()?;
    if (-MAX_SAFE_INT..=MAX_SAFE_INT).contains(&n) {
        Some(n)
    } else {
        None
    }
}

fn non_null_values(slots: &[ColumnSlot]) -> impl Iterator<Item = &Value> {
    slots
        .iter()
        .filter_map(|slot| slot.as_ref())
        .filter(|value| !value.is_null())
}

fn enum_eligible(slots: &[ColumnSlot]) -> bool {
    let mut distinct = BTreeSet::new();
    for value in non_null_values(slots) {
        match value.as_str() {
            Some(s) if !s.is_empty() && s.len() <= ENUM_MAX_STRING_BYTES => {
                distinct.insert(s);
                if distinct.len() > ENUM_MAX_DICT_ENTRIES {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

fn bool_eligible(slots: &[ColumnSlot]) -> bool {
    non_null_values(slots).all(|value| value.is_boolean())
}

fn int53_range(slots: &[ColumnSlot]) -> Option<(i64, i64)> {
    let mut range: Option<(i64, i64)> = None;
    for value in non_null_values(slots) {
        let n = as_int53(value)?;
        range = Some(match range {
            Some((min, max)) => (min.min(n), max.max(n)),
            None => (n, n),
        });
    }
    range
}

/// Pick the encoder for a column, in the deterministic selection order.
pub fn select_column_type(slots: &[ColumnSlot]) -> ColumnType {
    if non_null_values(slots).next().is_none() {
        return ColumnType::RawJson;
    }
    if enum_eligible(slots) {
        return ColumnType::EnumIds;
    }
    if bool_eligible(slots) {
        return ColumnType::BoolRle;
    }
    if let Some((min, max)) = int53_range(slots) {
        let sequential_ish = (max as i128 - min as i128) < 2 * slots.len() as i128;
        if sequential_ish {
            return ColumnType::DeltaZigzag;
        }
        return ColumnType::IntVarint;
    }
    ColumnType::RawJson
}

fn slot_int(slot: &ColumnSlot) -> Option<i64> {
    slot.as_ref().and_then(as_int53)
}

fn encode_int_varint(slots: &[ColumnSlot], out: &mut Vec<u8>) {
    for slot in slots {
        out.extend_from_slice(&encode_nullable_int(slot_int(slot)));
    }
}

fn encode_delta_zigzag(slots: &[ColumnSlot], out: &mut Vec<u8>) {
    let mut prev = 0i64;
    for slot in slots {
        match slot_int(slot) {
            Some(v) => {
                out.extend_from_slice(&encode_nullable_int(Some(v - prev)));
                prev = v;
            }
            None => out.extend_from_slice(&encode_nullable_int(None)),
        }
    }
}

fn encode_bool_rle(slots: &[ColumnSlot], out: &mut Vec<u8>) {
    let mut run: Option<(u8, u32)> = None;
    for slot in slots {
        let code = match slot.as_ref().and_then(Value::as_bool) {
            Some(true) => BOOL_CODE_TRUE,
            Some(false) => BOOL_CODE_FALSE,
            None => BOOL_CODE_NULL,
        };
        run = Some(match run {
            Some((current, len)) if current == code => (current, len + 1),
            Some((current, len)) => {
                out.push(current);
                out.extend_from_slice(&encode_varu32(len));
                (code, 1)
            }
            None => (code, 1),
        });
    }
    if let Some((code, len)) = run {
        out.push(code);
        out.extend_from_slice(&encode_varu32(len));
    }
}

fn encode_enum_ids(slots: &[ColumnSlot], out: &mut Vec<u8>) -> Result<()> {
    let dict: Vec<&str> = non_null_values(slots)
        .filter_map(Value::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    out.push(dict.len() as u8);
    for entry in &dict {
        out.extend_from_slice(&encode_varu32(entry.len() as u32));
        out.extend_from_slice(entry.as_bytes());
    }
    for slot in slots {
        match slot.as_ref().and_then(Value::as_str) {
            Some(s) => {
                let id = dict
                    .binary_search(&s)
                    .map_err(|_| JcoError::Internal("enum value missing from dictionary".to_string()))?;
                out.push(id as u8);
            }
            None => out.push(ENUM_NULL_ID),
        }
    }
    Ok(())
}

fn encode_raw_json(slots: &[ColumnSlot], out: &mut Vec<u8>) -> Result<()> {
    for slot in slots {
        let value = slot.as_ref().unwrap_or(&Value::Null);
        let json = serde_json::to_vec(value)
            .map_err(|e| JcoError::Internal(format!("value serialisation failed: {e}")))?;
        out.extend_from_slice(&encode_varu32(json.len() as u32));
        out.extend_from_slice(&json);
    }
    Ok(())
}

/// Encode a column, returning `type_tag || payload`.
pub fn encode_column(slots: &[ColumnSlot]) -> Result<Vec<u8>> {
    let column_type = select_column_type(slots);
    let mut out = Vec::new();
    out.push(column_type.tag());

    match column_type {
        ColumnType::IntVarint => encode_int_varint(slots, &mut out),
        ColumnType::DeltaZigzag => encode_delta_zigzag(slots, &mut out),
        ColumnType::BoolRle => encode_bool_rle(slots, &mut out),
        ColumnType::EnumIds => encode_enum_ids(slots, &mut out)?,
        ColumnType::RawJson => encode_raw_json(slots, &mut out)?,
        ColumnType::TimeDod => {
            return Err(JcoError::Internal(
                "TIME_DOD is never selected by this encoder".to_string(),
            ))
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slots(values: &[Value]) -> Vec<ColumnSlot> {
        values.iter().cloned().map(Some).collect()
    }

    #[test]
    fn test_selection_all_null_is_raw_json() {
        let column = vec![None, Some(Value::Null), None];
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_enum() {
        let column = slots(&[json!("info"), json!("warn"), json!("info")]);
        assert_eq!(select_column_type(&column), ColumnType::EnumIds);
    }

    #[test]
    fn test_selection_enum_rejects_long_strings() {
        let column = slots(&[json!("a-string-longer-than-sixteen-bytes")]);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_enum_rejects_empty_string() {
        let column = slots(&[json!(""), json!("x")]);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_enum_rejects_high_cardinality() {
        let values: Vec<Value> = (0..17).map(|i| json!(format!("v{i}"))).collect();
        let column = slots(&values);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_bool() {
        let column = vec![Some(json!(true)), None, Some(json!(false))];
        assert_eq!(select_column_type(&column), ColumnType::BoolRle);
    }

    #[test]
    fn test_selection_sequential_integers_pick_delta() {
        let column = slots(&[json!(1000), json!(1001), json!(1003)]);
        assert_eq!(select_column_type(&column), ColumnType::DeltaZigzag);
    }

    #[test]
    fn test_selection_spread_integers_pick_int_varint() {
        let column = slots(&[json!(1), json!(50_000), json!(9)]);
        assert_eq!(select_column_type(&column), ColumnType::IntVarint);
    }

    #[test]
    fn test_selection_delta_boundary_is_exclusive() {
        // max - min == 2 * count exactly: not sequential-ish.
        let column = slots(&[json!(0), json!(3), json!(6)]);
        assert_eq!(select_column_type(&column), ColumnType::IntVarint);
        // One tighter is sequential-ish.
        let column = slots(&[json!(0), json!(3), json!(5)]);
        assert_eq!(select_column_type(&column), ColumnType::DeltaZigzag);
    }

    #[test]
    fn test_selection_floats_are_raw() {
        let column = slots(&[json!(1.5), json!(2.5)]);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_mixed_types_are_raw() {
        let column = slots(&[json!("a"), json!(1), json!("b")]);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_selection_beyond_53_bits_is_raw() {
        let column = slots(&[json!(i64::MAX), json!(2)]);
        assert_eq!(select_column_type(&column), ColumnType::RawJson);
    }

    #[test]
    fn test_int_varint_payload_layout() {
        let column = vec![Some(json!(0)), None, Some(json!(-1))];
        let encoded = encode_column(&column).unwrap();
        // tag, zz(0)+1, null sentinel, zz(-1)+1
        assert_eq!(encoded, vec![COLUMN_INT_VARINT, 0x01, 0x00, 0x02]);
    }

    #[test]
    fn test_bool_rle_payload_layout() {
        let column = vec![
            Some(json!(true)),
            Some(json!(true)),
            None,
            Some(json!(false)),
        ];
        let encoded = encode_column(&column).unwrap();
        assert_eq!(
            encoded,
            vec![
                COLUMN_BOOL_RLE,
                BOOL_CODE_TRUE,
                0x02,
                BOOL_CODE_NULL,
                0x01,
                BOOL_CODE_FALSE,
                0x01
            ]
        );
    }

    #[test]
    fn test_enum_dictionary_is_sorted() {
        let column = slots(&[json!("warn"), json!("info"), json!("warn")]);
        let encoded = encode_column(&column).unwrap();
        assert_eq!(encoded[0], COLUMN_ENUM_IDS);
        assert_eq!(encoded[1], 2); // dict count
        // "info" sorts before "warn"
        assert_eq!(&encoded[3..7], b"info");
        assert_eq!(&encoded[8..12], b"warn");
        assert_eq!(&encoded[12..], &[1, 0, 1]);
    }

    #[test]
    fn test_raw_json_preserves_null_rows() {
        let column = vec![None, Some(Value::Null)];
        let encoded = encode_column(&column).unwrap();
        assert_eq!(encoded[0], COLUMN_RAW_JSON);
        assert_eq!(&encoded[1..], &[4, b'n', b'u', b'l', b'l', 4, b'n', b'u', b'l', b'l']);
    }
}
