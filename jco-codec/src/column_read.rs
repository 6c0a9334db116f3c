//! Typed column readers
//!
//! Each column payload is decoded once into a typed reader exposing
//! `value_at(row)`; the type dispatch happens per column, not per row. The
//! TIME_DOD reader exists so tagged streams from a future encoder stay
//! readable even though this encoder never emits tag 2.

use crate::column::ColumnType;
use jco_format::constants::{
    BOOL_CODE_FALSE, BOOL_CODE_NULL, BOOL_CODE_TRUE, ENUM_MAX_DICT_ENTRIES, ENUM_NULL_ID,
};
use jco_format::varint::{decode_nullable_int, decode_varu32};
use jco_format::{JcoError, Limits, Result};
use serde_json::Value;

/// Integer column decoded from INT_VARINT or DELTA_ZIGZAG payloads.
#[derive(Debug)]
pub struct IntColumn {
    values: Vec<Option<i64>>,
}

/// Boolean column decoded from BOOL_RLE payloads.
#[derive(Debug)]
pub struct BoolColumn {
    values: Vec<Option<bool>>,
}

/// Dictionary column decoded from ENUM_IDS payloads.
#[derive(Debug)]
pub struct EnumColumn {
    dict: Vec<String>,
    ids: Vec<u8>,
}

/// Fallback column decoded from RAW_JSON payloads.
#[derive(Debug)]
pub struct RawColumn {
    values: Vec<Value>,
}

/// A decoded column of one concrete type.
#[derive(Debug)]
pub enum ColumnReader {
    /// Integers (INT_VARINT, DELTA_ZIGZAG, or TIME_DOD).
    Int(IntColumn),
    /// Booleans.
    Bool(BoolColumn),
    /// Dictionary strings.
    Enum(EnumColumn),
    /// Raw JSON values.
    Raw(RawColumn),
}

impl ColumnReader {
    /// Decode a `type_tag || payload` column into a typed reader.
    pub fn decode(column: &[u8], rows: usize, limits: &Limits) -> Result<Self> {
        if column.is_empty() {
            return Err(JcoError::FrameCorrupt("empty column".to_string()));
        }
        let column_type = ColumnType::from_tag(column[0])?;
        let payload = &column[1..];

        match column_type {
            ColumnType::IntVarint => decode_int_varint(payload, rows).map(ColumnReader::Int),
            ColumnType::DeltaZigzag => decode_delta_zigzag(payload, rows).map(ColumnReader::Int),
            ColumnType::TimeDod => decode_time_dod(payload, rows).map(ColumnReader::Int),
            ColumnType::BoolRle => decode_bool_rle(payload, rows).map(ColumnReader::Bool),
            ColumnType::EnumIds => decode_enum_ids(payload, rows, limits).map(ColumnReader::Enum),
            ColumnType::RawJson => decode_raw_json(payload, rows, limits).map(ColumnReader::Raw),
        }
    }

    /// The value at `row`; `None` denotes a null slot.
    pub fn value_at(&self, row: usize) -> Option<Value> {
        match self {
            ColumnReader::Int(col) => col.values.get(row).copied().flatten().map(Value::from),
            ColumnReader::Bool(col) => col.values.get(row).copied().flatten().map(Value::from),
            ColumnReader::Enum(col) => match col.ids.get(row) {
                Some(&id) if id != ENUM_NULL_ID => {
                    Some(Value::String(col.dict[id as usize].clone()))
                }
                _ => None,
            },
            ColumnReader::Raw(col) => match col.values.get(row) {
                Some(Value::Null) | None => None,
                Some(value) => Some(value.clone()),
            },
        }
    }
}

fn expect_consumed(payload: &[u8], cursor: usize) -> Result<()> {
    if cursor != payload.len() {
        return Err(JcoError::FrameCorrupt(
            "column payload has trailing bytes".to_string(),
        ));
    }
    Ok(())
}

fn decode_int_varint(payload: &[u8], rows: usize) -> Result<IntColumn> {
    let mut values = Vec::with_capacity(rows);
    let mut cursor = 0;
    for _ in 0..rows {
        let (value, consumed) = decode_nullable_int(&payload[cursor..])?;
        cursor += consumed;
        values.push(value);
    }
    expect_consumed(payload, cursor)?;
    Ok(IntColumn { values })
}

fn decode_delta_zigzag(payload: &[u8], rows: usize) -> Result<IntColumn> {
    let mut values = Vec::with_capacity(rows);
    let mut cursor = 0;
    let mut prev = 0i64;
    for _ in 0..rows {
        let (delta, consumed) = decode_nullable_int(&payload[cursor..])?;
        cursor += consumed;
        match delta {
            Some(d) => {
                let value = prev
                    .checked_add(d)
                    .ok_or_else(|| JcoError::FrameCorrupt("delta overflow".to_string()))?;
                values.push(Some(value));
                prev = value;
            }
            None => values.push(None),
        }
    }
    expect_consumed(payload, cursor)?;
    Ok(IntColumn { values })
}

fn decode_time_dod(payload: &[u8], rows: usize) -> Result<IntColumn> {
    let mut values = Vec::with_capacity(rows);
    let mut cursor = 0;
    let mut prev = 0i64;
    let mut prev_delta = 0i64;
    let mut seen = 0usize;
    for _ in 0..rows {
        let (raw, consumed) = decode_nullable_int(&payload[cursor..])?;
        cursor += consumed;
        match raw {
            Some(r) => {
                let value = match seen {
                    0 => r,
                    1 => {
                        prev_delta = r;
                        prev.checked_add(r)
                            .ok_or_else(|| JcoError::FrameCorrupt("delta overflow".to_string()))?
                    }
                    _ => {
                        let delta = prev_delta
                            .checked_add(r)
                            .ok_or_else(|| JcoError::FrameCorrupt("delta overflow".to_string()))?;
                        prev_delta = delta;
                        prev.checked_add(delta)
                            .ok_or_else(|| JcoError::FrameCorrupt("delta overflow".to_string()))?
                    }
                };
                values.push(Some(value));
                prev = value;
                seen += 1;
            }
            None => values.push(None),
        }
    }
    expect_consumed(payload, cursor)?;
    Ok(IntColumn { values })
}

fn decode_bool_rle(payload: &[u8], rows: usize) -> Result<BoolColumn> {
    let mut values = Vec::with_capacity(rows);
    let mut cursor = 0;
    while values.len() < rows && cursor < payload.len() {
        let code = payload[cursor];
        cursor += 1;
        let value = match code {
            BOOL_CODE_NULL => None,
            BOOL_CODE_FALSE => Some(false),
            BOOL_CODE_TRUE => Some(true),
            other => {
                return Err(JcoError::FrameCorrupt(format!(
                    "bad boolean run code {other}"
                )))
            }
        };
        let (run_len, consumed) = decode_varu32(&payload[cursor..])?;
        cursor += consumed;
        let take = (run_len as usize).min(rows - values.len());
        values.extend(std::iter::repeat(value).take(take));
    }
    // Short streams pad with nulls; trailing groups are ignored.
    values.resize(rows, None);
    Ok(BoolColumn { values })
}

fn decode_enum_ids(payload: &[u8], rows: usize, limits: &Limits) -> Result<EnumColumn> {
    if payload.is_empty() {
        return Err(JcoError::FrameCorrupt("truncated enum column".to_string()));
    }
    let dict_count = payload[0] as usize;
    if dict_count > ENUM_MAX_DICT_ENTRIES {
        return Err(JcoError::FrameCorrupt(format!(
            "enum dictionary has {dict_count} entries"
        )));
    }
    let mut cursor = 1;

    let mut dict = Vec::with_capacity(dict_count);
    for _ in 0..dict_count {
        let (len, consumed) = decode_varu32(&payload[cursor..])?;
        cursor += consumed;
        let len = len as usize;
        if len > limits.max_value_bytes {
            return Err(JcoError::LimitExceeded(format!(
                "enum entry length {} exceeds limit {}",
                len, limits.max_value_bytes
            )));
        }
        let end = cursor
            .checked_add(len)
            .ok_or_else(|| JcoError::FrameCorrupt("enum entry length overflow".to_string()))?;
        if end > payload.len() {
            return Err(JcoError::FrameCorrupt("truncated enum column".to_string()));
        }
        let entry = std::str::from_utf8(&payload[cursor..end])
            .map_err(|_| JcoError::FrameCorrupt("enum entry is not UTF-8".to_string()))?;
        dict.push(entry.to_string());
        cursor = end;
    }

    let ids_end = cursor + rows;
    if ids_end > payload.len() {
        return Err(JcoError::FrameCorrupt("truncated enum column".to_string()));
    }
    let ids = payload[cursor..ids_end].to_vec();
    for &id in &ids {
        if id != ENUM_NULL_ID && id as usize >= dict_count {
            return Err(JcoError::FrameCorrupt(format!("enum id {id} out of range")));
        }
    }
    expect_consumed(payload, ids_end)?;

    Ok(EnumColumn { dict, ids })
}

fn decode_raw_json(payload: &[u8], rows: usize, limits: &Limits) -> Result<RawColumn> {
    let mut values = Vec::with_capacity(rows);
    let mut cursor = 0;
    for _ in 0..rows {
        let (len, consumed) = decode_varu32(&payload[cursor..])?;
        cursor += consumed;
        let len = len as usize;
        if len > limits.max_value_bytes {
            return Err(JcoError::LimitExceeded(format!(
                "value length {} exceeds limit {}",
                len, limits.max_value_bytes
            )));
        }
        let end = cursor
            .checked_add(len)
            .ok_or_else(|| JcoError::FrameCorrupt("value length overflow".to_string()))?;
        if end > payload.len() {
            return Err(JcoError::FrameCorrupt("truncated raw column".to_string()));
        }
        let value = serde_json::from_slice::<Value>(&payload[cursor..end])
            .map_err(|_| JcoError::FrameCorrupt("column value is not valid JSON".to_string()))?;
        values.push(value);
        cursor = end;
    }
    expect_consumed(payload, cursor)?;
    Ok(RawColumn { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{encode_column, ColumnSlot};
    use jco_format::varint::encode_nullable_int;
    use serde_json::json;

    fn roundtrip(slots: &[ColumnSlot]) -> Vec<Option<Value>> {
        let encoded = encode_column(slots).unwrap();
        let reader = ColumnReader::decode(&encoded, slots.len(), &Limits::default()).unwrap();
        (0..slots.len()).map(|row| reader.value_at(row)).collect()
    }

    fn expect_roundtrip(slots: Vec<ColumnSlot>) {
        let decoded = roundtrip(&slots);
        for (slot, value) in slots.iter().zip(decoded.iter()) {
            let expected = match slot {
                Some(Value::Null) | None => None,
                Some(other) => Some(other.clone()),
            };
            assert_eq!(value, &expected);
        }
    }

    #[test]
    fn test_int_varint_roundtrip() {
        expect_roundtrip(vec![
            Some(json!(0)),
            Some(json!(-1)),
            None,
            Some(json!(1i64 << 52)),
            Some(json!(-(1i64 << 52))),
        ]);
    }

    #[test]
    fn test_delta_roundtrip_with_null_gaps() {
        expect_roundtrip(vec![
            Some(json!(1000)),
            None,
            Some(json!(1001)),
            Some(json!(999)),
            Some(Value::Null),
            Some(json!(1002)),
        ]);
    }

    #[test]
    fn test_bool_roundtrip() {
        expect_roundtrip(vec![
            Some(json!(true)),
            Some(json!(true)),
            None,
            Some(json!(false)),
            None,
        ]);
    }

    #[test]
    fn test_enum_roundtrip() {
        expect_roundtrip(vec![
            Some(json!("info")),
            Some(json!("warn")),
            None,
            Some(json!("info")),
        ]);
    }

    #[test]
    fn test_raw_json_roundtrip_mixed_types() {
        expect_roundtrip(vec![
            Some(json!("text")),
            Some(json!(3.25)),
            Some(json!({"nested": [1, 2]})),
            None,
            Some(json!([true, null])),
        ]);
    }

    #[test]
    fn test_all_null_column_roundtrip() {
        expect_roundtrip(vec![None, Some(Value::Null), None]);
    }

    #[test]
    fn test_bool_short_stream_pads_nulls() {
        // One run of two trues, but four rows requested.
        let column = vec![3u8, BOOL_CODE_TRUE, 0x02];
        let reader = ColumnReader::decode(&column, 4, &Limits::default()).unwrap();
        assert_eq!(reader.value_at(0), Some(json!(true)));
        assert_eq!(reader.value_at(1), Some(json!(true)));
        assert_eq!(reader.value_at(2), None);
        assert_eq!(reader.value_at(3), None);
    }

    #[test]
    fn test_bool_trailing_groups_ignored() {
        let column = vec![3u8, BOOL_CODE_FALSE, 0x01, BOOL_CODE_TRUE, 0x05];
        let reader = ColumnReader::decode(&column, 1, &Limits::default()).unwrap();
        assert_eq!(reader.value_at(0), Some(json!(false)));
    }

    #[test]
    fn test_bool_bad_run_code() {
        let column = vec![3u8, 9, 0x01];
        assert!(matches!(
            ColumnReader::decode(&column, 1, &Limits::default()),
            Err(JcoError::FrameCorrupt(_))
        ));
    }

    #[test]
    fn test_enum_id_out_of_range() {
        // dict of one entry, id 7 referenced.
        let column = vec![4u8, 1, 1, b'x', 7];
        assert!(matches!(
            ColumnReader::decode(&column, 1, &Limits::default()),
            Err(JcoError::FrameCorrupt(_))
        ));
    }

    #[test]
    fn test_enum_null_id_is_exempt() {
        let column = vec![4u8, 1, 1, b'x', ENUM_NULL_ID];
        let reader = ColumnReader::decode(&column, 1, &Limits::default()).unwrap();
        assert_eq!(reader.value_at(0), None);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let column = vec![9u8, 0, 0];
        assert!(matches!(
            ColumnReader::decode(&column, 1, &Limits::default()),
            Err(JcoError::FrameCorrupt(_))
        ));
    }

    #[test]
    fn test_reserved_tag_5_rejected() {
        let column = vec![5u8, 0];
        assert!(matches!(
            ColumnReader::decode(&column, 1, &Limits::default()),
            Err(JcoError::FrameCorrupt(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut column = encode_column(&[Some(json!(1)), Some(json!(2))]).unwrap();
        column.push(0x00);
        assert!(matches!(
            ColumnReader::decode(&column, 2, &Limits::default()),
            Err(JcoError::FrameCorrupt(_))
        ));
    }

    #[test]
    fn test_time_dod_decode() {
        // Values 100, 110, 121, null, 133: deltas 10, 11, 12 -> dods 1, 1.
        let mut payload = vec![2u8];
        payload.extend_from_slice(&encode_nullable_int(Some(100)));
        payload.extend_from_slice(&encode_nullable_int(Some(10)));
        payload.extend_from_slice(&encode_nullable_int(Some(1)));
        payload.extend_from_slice(&encode_nullable_int(None));
        payload.extend_from_slice(&encode_nullable_int(Some(1)));

        let reader = ColumnReader::decode(&payload, 5, &Limits::default()).unwrap();
        assert_eq!(reader.value_at(0), Some(json!(100)));
        assert_eq!(reader.value_at(1), Some(json!(110)));
        assert_eq!(reader.value_at(2), Some(json!(121)));
        assert_eq!(reader.value_at(3), None);
        assert_eq!(reader.value_at(4), Some(json!(133)));
    }

    proptest::proptest! {
        #[test]
        fn prop_integer_columns_roundtrip(
            values in proptest::collection::vec(
                proptest::option::of(-(1i64 << 53) + 1..(1i64 << 53)),
                0..64,
            )
        ) {
            let slots: Vec<ColumnSlot> = values.iter().map(|v| v.map(Value::from)).collect();
            let decoded = roundtrip(&slots);
            for (value, decoded) in values.iter().zip(decoded.iter()) {
                let expected = value.map(Value::from);
                proptest::prop_assert_eq!(decoded, &expected);
            }
        }
    }
}
