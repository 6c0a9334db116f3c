//! End-to-end scenarios over the public surface

use jco_io::{
    compress, compress_ndjson, decompress, decompress_ndjson, CodecChoice, CompressOptions,
    DecodeOptions, NdjsonOptions,
};
use serde_json::{json, Value};

fn columnar_opts() -> NdjsonOptions {
    NdjsonOptions {
        columnar: true,
        ..NdjsonOptions::default()
    }
}

fn decode_fields(container: &[u8], fields: &[&str]) -> String {
    decompress_ndjson(
        container,
        &DecodeOptions {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            ..DecodeOptions::default()
        },
    )
    .unwrap()
}

fn parse_lines(text: &str) -> Vec<Option<Value>> {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                None
            } else {
                Some(serde_json::from_str(line).unwrap())
            }
        })
        .collect()
}

#[test]
fn logs_profile_full_and_selective() {
    let input = concat!(
        "{\"ts\":\"2024-01-01T00:00:00.000Z\",\"level\":\"info\",\"service\":\"api\",\"message\":\"start\",\"id\":1}\n",
        "{\"ts\":\"2024-01-01T00:00:01.000Z\",\"level\":\"info\",\"service\":\"api\",\"message\":\"ok\",\"id\":2}\n",
        "{\"ts\":\"2024-01-01T00:00:02.000Z\",\"level\":\"warn\",\"service\":\"api\",\"message\":\"slow\",\"id\":3}",
    );

    let container = compress_ndjson(input, &columnar_opts()).unwrap();

    let full = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();
    let full_lines: Vec<&str> = full.split('\n').collect();
    assert_eq!(full_lines.len(), 3);
    for (original, decoded) in input.lines().zip(full_lines.iter()) {
        let left: Value = serde_json::from_str(original).unwrap();
        let right: Value = serde_json::from_str(decoded).unwrap();
        assert_eq!(left, right);
    }

    let selective = decode_fields(&container, &["ts", "level", "service"]);
    let lines: Vec<&str> = selective.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        serde_json::from_str::<Value>(lines[0]).unwrap(),
        json!({"ts": "2024-01-01T00:00:00.000Z", "level": "info", "service": "api"})
    );
    assert_eq!(
        serde_json::from_str::<Value>(lines[2]).unwrap(),
        json!({"ts": "2024-01-01T00:00:02.000Z", "level": "warn", "service": "api"})
    );
    for line in &lines {
        let object: Value = serde_json::from_str(line).unwrap();
        assert_eq!(object.as_object().unwrap().len(), 3);
    }
}

#[test]
fn blank_line_positions_survive() {
    let input = "{\"a\":1}\n\n{\"b\":2}\n   \n{\"c\":3}";
    let container = compress_ndjson(input, &columnar_opts()).unwrap();
    let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();

    let lines = parse_lines(&decoded);
    assert_eq!(lines.len(), 5);
    assert!(lines[1].is_none());
    assert!(lines[3].is_none());
    assert_eq!(lines[0], Some(json!({"a": 1})));
    assert_eq!(lines[2], Some(json!({"b": 2})));
    assert_eq!(lines[4], Some(json!({"c": 3})));
}

#[test]
fn schema_drift_selective_decode() {
    let input = jco_test_utils::drifting_schema(10, 10);
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();

    let only_a = decode_fields(&container, &["a"]);
    let lines = parse_lines(&only_a);
    assert_eq!(lines.len(), 21); // 20 records plus the trailing newline slot
    for (i, line) in lines.iter().take(20).enumerate() {
        assert_eq!(line.as_ref().unwrap(), &json!({ "a": i }));
    }

    let only_b = decode_fields(&container, &["b"]);
    let lines = parse_lines(&only_b);
    for (i, line) in lines.iter().take(10).enumerate() {
        assert_eq!(line.as_ref().unwrap(), &json!({ "b": i * 2 }));
    }
    for line in lines.iter().skip(10).take(10) {
        assert_eq!(line.as_ref().unwrap(), &json!({}));
    }

    let only_c = decode_fields(&container, &["c"]);
    let lines = parse_lines(&only_c);
    for line in lines.iter().take(10) {
        assert_eq!(line.as_ref().unwrap(), &json!({}));
    }
    for (i, line) in lines.iter().skip(10).take(10).enumerate() {
        assert_eq!(
            line.as_ref().unwrap(),
            &json!({ "c": format!("v{}", i + 10) })
        );
    }
}

#[test]
fn crc_tamper_fails_decode_at_every_position() {
    let container = compress(r#"{"hello":"world"}"#, &CompressOptions::default()).unwrap();

    let header_len = u32::from_le_bytes([container[4], container[5], container[6], container[7]])
        as usize;
    let body_start = 8 + header_len + 4;
    assert!(body_start < container.len());

    for position in body_start..container.len() {
        let mut tampered = container.clone();
        tampered[position] ^= 0x01;
        let err = decompress(&tampered).unwrap_err();
        assert!(
            matches!(err, jco_io::JcoError::ContainerCorrupt(_)),
            "byte {position} should fail CRC, got {err:?}"
        );
    }
}

#[test]
fn codec_header_honesty() {
    let input = r#"{"hello":"world"}"#;

    let dense = compress(
        input,
        &CompressOptions {
            codec: CodecChoice::Dense,
            ..CompressOptions::default()
        },
    )
    .unwrap();
    let (header, _) = jco_format::container::unwrap(&dense).unwrap();
    assert_eq!(header.codec, "dense");

    let default = compress(input, &CompressOptions::default()).unwrap();
    let (header, _) = jco_format::container::unwrap(&default).unwrap();
    assert_eq!(header.codec, "hybrid");
}

#[test]
fn mixed_type_columns_roundtrip_bitwise() {
    let input = jco_test_utils::mixed_type_records(50);
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();
    let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();

    for (original, decoded) in input.lines().zip(decoded.lines()) {
        assert_eq!(original, decoded);
    }
}

#[test]
fn empty_input_roundtrip() {
    let container = compress_ndjson("", &NdjsonOptions::default()).unwrap();
    let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded, "");
}

#[test]
fn single_scalar_document_roundtrip() {
    let container = compress("0", &CompressOptions::default()).unwrap();
    assert_eq!(decompress(&container).unwrap(), "0");
}

#[test]
fn all_null_column_roundtrip() {
    let input = "{\"v\":null,\"pad\":\"xxxxxxxxxxxx\"}\n{\"v\":null,\"pad\":\"xxxxxxxxxxxx\"}\n{\"v\":null,\"pad\":\"xxxxxxxxxxxx\"}";
    let container = compress_ndjson(input, &columnar_opts()).unwrap();
    let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();
    for line in decoded.split('\n') {
        let value: Value = serde_json::from_str(line).unwrap();
        assert_eq!(value.get("v"), Some(&Value::Null));
    }
}

#[test]
fn frame_split_at_4096_rows_roundtrips() {
    let mut input = String::new();
    for i in 0..4097 {
        input.push_str(&format!("{{\"seq\":{i}}}\n"));
    }
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();
    let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();

    let lines: Vec<&str> = decoded.split('\n').collect();
    assert_eq!(lines.len(), 4098);
    for (i, line) in lines.iter().take(4097).enumerate() {
        assert_eq!(
            serde_json::from_str::<Value>(line).unwrap(),
            json!({ "seq": i })
        );
    }
}

#[test]
fn selective_decode_preserves_line_count_with_blanks() {
    let input = jco_test_utils::with_blank_lines(&jco_test_utils::log_records(20), 4);
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();

    let full = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();
    let selective = decode_fields(&container, &["level"]);
    assert_eq!(
        full.split('\n').count(),
        selective.split('\n').count()
    );

    for (full_line, selective_line) in full.split('\n').zip(selective.split('\n')) {
        assert_eq!(full_line.is_empty(), selective_line.is_empty());
        if !selective_line.is_empty() {
            let object: Value = serde_json::from_str(selective_line).unwrap();
            for key in object.as_object().unwrap().keys() {
                assert_eq!(key, "level");
            }
        }
    }
}

#[test]
fn every_codec_roundtrips_ndjson() {
    let input = jco_test_utils::log_records(100);
    for codec in [
        CodecChoice::Hybrid,
        CodecChoice::Fast,
        CodecChoice::Dense,
        CodecChoice::Identity,
    ] {
        let container = compress_ndjson(
            &input,
            &NdjsonOptions {
                codec: codec.clone(),
                columnar: true,
                ..NdjsonOptions::default()
            },
        )
        .unwrap();
        let decoded = decompress_ndjson(&container, &DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.split('\n').count(),
            input.split('\n').count(),
            "codec {codec:?} changed the line count"
        );
    }
}
