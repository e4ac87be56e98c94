use flexbuf::{Builder, FlexError, FlxValue, ValueType};
use flexbuf_json::{
    flexbuf_bytes_to_json, flexbuf_to_json, json_str_to_flexbuf, json_to_flexbuf,
    ordered_json_text, BridgeError, BridgeOptions,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("value must be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn plain_round_trip_sorts_keys() {
    let doc = json!({
        "b": 1,
        "a": [1, 2.5, "x", null, true, {"z": false}],
        "c": {"n": -3, "big": 18446744073709551615u64}
    });
    let options = BridgeOptions::default();
    let bytes = json_to_flexbuf(&doc, &options).expect("encode must succeed");
    let back = flexbuf_bytes_to_json(&bytes, &options).expect("decode must succeed");
    assert_eq!(back, doc);
    assert_eq!(keys(&back), vec!["a", "b", "c"]);
}

#[test]
fn index_prefix_keeps_document_order() {
    let text = r#"{"zeta":1,"alpha":{"y":2,"x":3},"mid":[{"q":1,"p":2}]}"#;
    let options = BridgeOptions::default().with_index_key_prefix(2);
    let bytes = json_str_to_flexbuf(text, &options).expect("encode must succeed");

    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert!(root.as_map().unwrap().has_key("01zeta").unwrap());

    let back = flexbuf_to_json(root, &options).expect("decode must succeed");
    assert_eq!(back.to_string(), text);
    assert_eq!(keys(&back), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn decoding_needs_the_prefix() {
    let bytes = json_to_flexbuf(&json!({"a": 1}), &BridgeOptions::default()).unwrap();
    let result = flexbuf_bytes_to_json(&bytes, &BridgeOptions::default().with_index_key_prefix(2));
    assert!(matches!(
        result,
        Err(BridgeError::MissingKeyPrefix { digits: 2, .. })
    ));
}

#[test]
fn invalid_input_is_reported() {
    assert!(matches!(
        json_str_to_flexbuf("{not json", &BridgeOptions::default()),
        Err(BridgeError::Json(_))
    ));
    assert!(matches!(
        flexbuf_bytes_to_json(&[1], &BridgeOptions::default()),
        Err(BridgeError::Flex(FlexError::InvalidBuffer(_)))
    ));
}

#[test]
fn blobs_and_special_floats() {
    let mut builder = Builder::new();
    builder
        .vector(|b| {
            b.add_blob(b"hi")?;
            b.add_float(f64::NAN)?;
            b.add_indirect_float(0.5)?;
            b.add_indirect_uint(7)
        })
        .unwrap();
    let bytes = builder.finish().unwrap();
    let back = flexbuf_bytes_to_json(&bytes, &BridgeOptions::default()).unwrap();
    assert_eq!(back, json!(["aGk=", null, 0.5, 7]));
}

#[test]
fn typed_vectors_decode_to_arrays() {
    let doc = json!({"ints": [1, 2, 3], "strs": ["a", "b"], "flags": [true, false, true, false, true]});
    let bytes = json_to_flexbuf(&doc, &BridgeOptions::default()).unwrap();
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(root.get("ints").unwrap().value_type(), ValueType::VectorInt3);
    assert_eq!(root.get("strs").unwrap().value_type(), ValueType::Vector);
    assert_eq!(root.get("flags").unwrap().value_type(), ValueType::VectorBool);
    assert_eq!(flexbuf_to_json(root, &BridgeOptions::default()).unwrap(), doc);
}

#[test]
fn string_arrays_with_nuls_round_trip() {
    let long = format!("a\u{0}{}", "b".repeat(254));
    let doc = json!({"lines": [long, "\u{0}", "tail"]});
    let bytes = json_str_to_flexbuf(&doc.to_string(), &BridgeOptions::default()).unwrap();
    let back = flexbuf_bytes_to_json(&bytes, &BridgeOptions::default()).unwrap();
    assert_eq!(back, doc);
    assert_eq!(back["lines"][0].as_str().map(str::len), Some(256));
}

#[test]
fn ordered_text_matches_serde_output() {
    let doc = json!({
        "zeta": 1,
        "path": "a/b\\c",
        "quote": "say \"hi\"\n",
        "nested": {"y": [1, 2], "x": null},
    });
    let compact = ordered_json_text(&doc, 2, false).expect("render must succeed");
    assert_eq!(compact, serde_json::to_string(&doc).unwrap());

    let pretty = ordered_json_text(&json!({"b": 1, "a": {"c": true}}), 2, true).unwrap();
    assert_eq!(pretty, "{\n  \"b\": 1,\n  \"a\": {\n    \"c\": true\n  }\n}");
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        "[a-zA-Z0-9 /\\\\\"\n\t\r]{0,16}".prop_map(Value::String),
        "\\PC{0,8}".prop_map(Value::String),
    ]
}

/// Strings with any control character, NUL included. The rendered text
/// path leaves those unescaped, so only the value round trip uses them.
fn raw_json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        json_leaf(),
        "[\\x00-\\x7f]{0,300}".prop_map(Value::String),
        any::<String>().prop_map(Value::String),
    ]
}

fn raw_json_tree() -> impl Strategy<Value = Value> {
    raw_json_leaf().prop_recursive(4, 40, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec("[\\x00-\\x7f]{0,300}", 1..5)
                .prop_map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
            prop::collection::vec(("[a-z/\\\\]{0,6}", inner), 0..6).prop_map(|entries| {
                Value::Object(entries.into_iter().collect::<Map<String, Value>>())
            }),
        ]
    })
}

fn json_tree() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 40, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z/\\\\]{0,6}", inner), 0..6).prop_map(|entries| {
                Value::Object(entries.into_iter().collect::<Map<String, Value>>())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prefixed_round_trip_is_lossless(doc in raw_json_tree()) {
        let options = BridgeOptions::default().with_index_key_prefix(2);
        let bytes = json_to_flexbuf(&doc, &options).unwrap();
        let back = flexbuf_bytes_to_json(&bytes, &options).unwrap();
        prop_assert_eq!(back.to_string(), doc.to_string());
    }

    #[test]
    fn ordered_text_parses_back(doc in json_tree()) {
        let text = ordered_json_text(&doc, 2, false).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(parsed.to_string(), doc.to_string());

        let pretty = ordered_json_text(&doc, 2, true).unwrap();
        let parsed: Value = serde_json::from_str(&pretty).unwrap();
        prop_assert_eq!(parsed.to_string(), doc.to_string());
    }
}
