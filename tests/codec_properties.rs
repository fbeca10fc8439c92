//! Purpose: Property-style coverage of the wire codec through the public API.
//! Exports: Integration tests only.
//! Role: Pin array wire types, scanner balance, depth bounding, and decode heuristics.
//! Invariants: Inputs are generated by small loops; no randomness, no network.

use soapwire::core::decode::{MAX_DECODE_DEPTH, decode};
use soapwire::core::encode::{encode, encode_with};
use soapwire::core::scan::scan_top_level_blocks;
use soapwire::core::value::{DecodedValue, EncodableScalar, EncodableValue};

fn only_item(value: DecodedValue) -> DecodedValue {
    match value {
        DecodedValue::List(mut items) if items.len() == 1 => items.remove(0),
        other => panic!("expected single-item list, got {other:?}"),
    }
}

fn record(index: usize) -> EncodableValue {
    EncodableValue::record([
        ("to", EncodableScalar::str(format!("user{index}@x.com"))),
        ("subject", EncodableScalar::str("Hi")),
    ])
}

#[test]
fn scalars_survive_encode_then_decode() {
    let special = r#"with & < > " ' chars"#;
    let cases = [
        (EncodableValue::Null, DecodedValue::Null),
        (EncodableValue::Bool(true), DecodedValue::Bool(true)),
        (EncodableValue::Bool(false), DecodedValue::Bool(false)),
        (EncodableValue::Int(0), DecodedValue::Number(0.0)),
        (EncodableValue::Int(-3), DecodedValue::Number(-3.0)),
        (EncodableValue::Double(3.14), DecodedValue::Number(3.14)),
        (
            EncodableValue::str("plain"),
            DecodedValue::Str("plain".to_string()),
        ),
        (
            EncodableValue::str(special),
            DecodedValue::Str(special.to_string()),
        ),
    ];
    for (input, expected) in cases {
        let fragment = encode(&input);
        assert_eq!(only_item(decode(&fragment, 0)), expected, "{fragment}");
    }
}

#[test]
fn integer_arrays_declare_int_until_any_other_element_appears() {
    for len in 0..=50usize {
        let ints: Vec<EncodableValue> = (0..len as i64).map(EncodableValue::Int).collect();
        let encoded = encode(&EncodableValue::Array(ints.clone()));
        assert!(
            encoded.contains(&format!("SOAP-ENC:arrayType=\"xsd:int[{len}]\"")),
            "len {len}"
        );

        if len == 0 {
            continue;
        }
        for position in [0, len / 2, len - 1] {
            for intruder in [EncodableValue::Double(0.5), EncodableValue::str("7")] {
                let mut mixed = ints.clone();
                mixed[position] = intruder;
                let encoded = encode(&EncodableValue::Array(mixed));
                assert!(
                    encoded.contains(&format!("SOAP-ENC:arrayType=\"xsd:string[{len}]\"")),
                    "len {len} position {position}"
                );
            }
        }
    }
}

#[test]
fn record_arrays_are_structs_by_default_and_maps_when_flagged() {
    for len in 1..=12usize {
        let records = EncodableValue::Array((0..len).map(record).collect());

        let structs = encode(&records);
        assert!(structs.contains(&format!("SOAP-ENC:arrayType=\"SOAP-ENC:Struct[{len}]\"")));
        assert_eq!(structs.matches("<subject xsi:type=\"xsd:string\">Hi</subject>").count(), len);

        let maps = encode_with(&records, true);
        assert!(maps.contains(&format!("SOAP-ENC:arrayType=\"ns2:Map[{len}]\"")));
        assert_eq!(maps.matches("<key xsi:type=\"xsd:string\">").count(), 2 * len);
        assert_eq!(maps.matches("<value xsi:type=\"xsd:string\">").count(), 2 * len);
    }
}

#[test]
fn map_encoded_records_decode_back_to_objects() {
    let records = EncodableValue::Array((0..3).map(record).collect());
    let decoded = only_item(decode(&encode_with(&records, true), 0));
    let items = decoded.require_list().expect("records");
    assert_eq!(items.len(), 3);
    for (index, item) in items.iter().enumerate() {
        assert_eq!(
            item.field("to").expect("to").require_str().expect("str"),
            format!("user{index}@x.com")
        );
        assert_eq!(
            item.get("subject"),
            Some(&DecodedValue::Str("Hi".to_string()))
        );
    }
}

#[test]
fn scanner_keeps_nested_arrays_inside_their_parent() {
    let inner = |a: i64, b: i64| {
        EncodableValue::Array(vec![EncodableValue::Int(a), EncodableValue::Int(b)])
    };
    let outer = encode(&EncodableValue::Array(vec![inner(1, 2), inner(3, 4)]));
    let start = outer.find('>').expect("outer open") + 1;
    let end = outer.rfind("</item>").expect("outer close");
    let body = &outer[start..end];

    let blocks = scan_top_level_blocks(body);
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].slice(body), encode(&inner(1, 2)));
    assert_eq!(blocks[1].slice(body), encode(&inner(3, 4)));
}

#[test]
fn deep_nesting_stops_at_the_depth_bound() {
    let mut fragment = "bottom".to_string();
    for _ in 0..10 {
        fragment = format!("<item xsi:type=\"SOAP-ENC:Array\">{fragment}</item>");
    }

    let mut current = decode(&fragment, 0);
    let mut depth = 0;
    loop {
        match current {
            DecodedValue::List(mut items) => {
                current = items.pop().expect("nested item");
                depth += 1;
            }
            DecodedValue::Str(opaque) => {
                assert!(opaque.contains("<item"));
                assert!(opaque.contains("bottom"));
                break;
            }
            other => panic!("unexpected {other:?} at depth {depth}"),
        }
    }
    assert_eq!(depth, MAX_DECODE_DEPTH + 1);
}

#[test]
fn nested_msg_fields_merge_without_overwriting() {
    let entry = |key: &str, value: &str| {
        format!("<item><key xsi:type=\"xsd:string\">{key}</key>{value}</item>")
    };
    let int = |n: i64| format!("<value xsi:type=\"xsd:int\">{n}</value>");
    let msg = format!(
        "<value xsi:type=\"ns2:Map\">{}{}</value>",
        entry("foo", &int(1)),
        entry("bar", &int(2))
    );
    let body = format!("{}{}", entry("msg", &msg), entry("foo", &int(0)));

    let decoded = decode(&body, 0);
    assert_eq!(
        decoded.to_json(),
        serde_json::json!({"msg": {"foo": 1, "bar": 2}, "foo": 0, "bar": 2})
    );
}

#[test]
fn zero_padded_numbers_stay_strings() {
    let fragment = encode(&EncodableValue::str("007"));
    assert_eq!(
        only_item(decode(&fragment, 0)),
        DecodedValue::Str("007".to_string())
    );
}
