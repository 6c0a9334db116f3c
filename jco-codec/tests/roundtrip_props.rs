//! Property tests across the full columnar pipeline

use jco_codec::decode::decode_columnar;
use jco_codec::shape::{encode_columnar, ColumnarOutcome};
use jco_format::Limits;
use proptest::prelude::*;
use serde_json::{json, Value};

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-(1i64 << 53) + 1..(1i64 << 53)).prop_map(Value::from),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::from),
        proptest::collection::vec(0i32..100, 0..4).prop_map(|v| json!(v)),
    ]
}

fn record_strategy() -> impl Strategy<Value = Value> {
    (value_strategy(), value_strategy(), value_strategy())
        .prop_map(|(a, b, c)| json!({ "a": a, "b": b, "c": c, "pad": "corpus-padding" }))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn columnar_full_decode_is_parse_equal(
        records in proptest::collection::vec(record_strategy(), 3..40)
    ) {
        let mut text = String::new();
        for record in &records {
            text.push_str(&record.to_string());
            text.push('\n');
        }

        let body = match encode_columnar(&text).unwrap() {
            ColumnarOutcome::Encoded(bytes) => bytes,
            ColumnarOutcome::Declined => {
                prop_assert!(false, "unexpected decline");
                unreachable!()
            }
        };
        let decoded = decode_columnar(&body, None, &Limits::default()).unwrap();

        let decoded_lines: Vec<&str> = decoded.split('\n').collect();
        prop_assert_eq!(decoded_lines.len(), records.len() + 1);
        prop_assert_eq!(decoded_lines[records.len()], "");

        for (record, line) in records.iter().zip(decoded_lines.iter()) {
            let parsed: Value = serde_json::from_str(line).unwrap();
            prop_assert_eq!(record, &parsed);
        }
    }

    #[test]
    fn columnar_selective_decode_projects_a(
        records in proptest::collection::vec(record_strategy(), 3..40)
    ) {
        let mut text = String::new();
        for record in &records {
            text.push_str(&record.to_string());
            text.push('\n');
        }

        let body = match encode_columnar(&text).unwrap() {
            ColumnarOutcome::Encoded(bytes) => bytes,
            ColumnarOutcome::Declined => {
                prop_assert!(false, "unexpected decline");
                unreachable!()
            }
        };
        let fields = vec!["a".to_string()];
        let decoded = decode_columnar(&body, Some(&fields), &Limits::default()).unwrap();

        for (record, line) in records.iter().zip(decoded.split('\n')) {
            let parsed: Value = serde_json::from_str(line).unwrap();
            prop_assert_eq!(parsed.as_object().unwrap().len(), 1);
            prop_assert_eq!(parsed.get("a").unwrap(), record.get("a").unwrap());
        }
    }
}
