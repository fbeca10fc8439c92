//! Purpose: Encode `EncodableValue`s into AXIS/xml-soap `item` fragments.
//! Exports: `encode`, `encode_with`, `MapEncodingPolicy`, `ARRAY_TYPE_*` tags.
//! Role: Pure function of its input; the envelope builder embeds its output verbatim.
//! Invariants: Output is deterministic for identical input (debug diffs and tests rely on it).
//! Invariants: Arrays declare one wire element type: struct, map, int, or string.
//! Notes: No validation is done; non-finite doubles use the XSD lexical forms NaN/INF/-INF.
use std::collections::BTreeSet;
use std::fmt::Write;

use super::escape::escape;
use super::value::{EncodableScalar, EncodableValue, Record};

pub const ARRAY_TYPE_STRUCT: &str = "SOAP-ENC:Struct";
pub const ARRAY_TYPE_MAP: &str = "ns2:Map";
pub const ARRAY_TYPE_INT: &str = "xsd:int";
pub const ARRAY_TYPE_STRING: &str = "xsd:string";

/// Methods whose record arrays travel as `ns2:Map` key/value items instead of structs.
///
/// Only one remote method is known to need this, and its name is not confirmed, so the set
/// is injected by the caller and empty by default.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MapEncodingPolicy {
    methods: BTreeSet<String>,
}

impl MapEncodingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.insert(method.into());
        self
    }

    pub fn uses_map_encoding(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for MapEncodingPolicy {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            methods: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Encodes with struct shape for record arrays.
pub fn encode(value: &EncodableValue) -> String {
    encode_with(value, false)
}

/// Encodes `value`; `map_records` selects `ns2:Map` items for arrays of records.
pub fn encode_with(value: &EncodableValue, map_records: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, "item", value, map_records);
    out
}

fn write_value(out: &mut String, tag: &str, value: &EncodableValue, map_records: bool) {
    match value {
        EncodableValue::Null => write_nil(out, tag),
        EncodableValue::Bool(flag) => write_bool(out, tag, *flag),
        EncodableValue::Int(int) => write_typed(out, tag, "xsd:int", &int.to_string()),
        EncodableValue::Double(number) => write_double(out, tag, *number),
        EncodableValue::Str(text) => write_typed(out, tag, "xsd:string", &escape(text)),
        EncodableValue::Record(fields) => write_struct(out, tag, fields),
        EncodableValue::Array(items) => write_array(out, tag, items, map_records),
    }
}

fn write_scalar(out: &mut String, tag: &str, scalar: &EncodableScalar) {
    match scalar {
        EncodableScalar::Null => write_nil(out, tag),
        EncodableScalar::Bool(flag) => write_bool(out, tag, *flag),
        EncodableScalar::Int(int) => write_typed(out, tag, "xsd:int", &int.to_string()),
        EncodableScalar::Double(number) => write_double(out, tag, *number),
        EncodableScalar::Str(text) => write_typed(out, tag, "xsd:string", &escape(text)),
    }
}

fn write_nil(out: &mut String, tag: &str) {
    let _ = write!(out, "<{tag} xsi:nil=\"true\"/>");
}

fn write_bool(out: &mut String, tag: &str, flag: bool) {
    write_typed(out, tag, "xsd:boolean", if flag { "true" } else { "false" });
}

fn write_double(out: &mut String, tag: &str, number: f64) {
    if is_integral(number) {
        write_typed(out, tag, "xsd:int", &number.to_string());
    } else {
        write_typed(out, tag, "xsd:double", &double_text(number));
    }
}

fn write_typed(out: &mut String, tag: &str, xsd_type: &str, text: &str) {
    let _ = write!(out, "<{tag} xsi:type=\"{xsd_type}\">{text}</{tag}>");
}

fn write_struct(out: &mut String, tag: &str, fields: &Record) {
    let _ = write!(out, "<{tag} xsi:type=\"{ARRAY_TYPE_STRUCT}\">");
    for (name, scalar) in fields {
        write_scalar(out, name, scalar);
    }
    let _ = write!(out, "</{tag}>");
}

fn write_map(out: &mut String, tag: &str, fields: &Record) {
    let _ = write!(out, "<{tag} xsi:type=\"{ARRAY_TYPE_MAP}\">");
    for (name, scalar) in fields {
        out.push_str("<item>");
        write_typed(out, "key", "xsd:string", &escape(name));
        write_scalar(out, "value", scalar);
        out.push_str("</item>");
    }
    let _ = write!(out, "</{tag}>");
}

fn write_array(out: &mut String, tag: &str, items: &[EncodableValue], map_records: bool) {
    let records: Option<Vec<&Record>> = if items.is_empty() {
        None
    } else {
        items
            .iter()
            .map(|item| match item {
                EncodableValue::Record(fields) => Some(fields),
                _ => None,
            })
            .collect()
    };

    let element_type = match (&records, map_records) {
        (Some(_), true) => ARRAY_TYPE_MAP,
        (Some(_), false) => ARRAY_TYPE_STRUCT,
        (None, _) if items.iter().all(is_integer) => ARRAY_TYPE_INT,
        (None, _) => ARRAY_TYPE_STRING,
    };
    let _ = write!(
        out,
        "<{tag} SOAP-ENC:arrayType=\"{element_type}[{}]\" xsi:type=\"SOAP-ENC:Array\">",
        items.len()
    );
    match records {
        Some(records) if map_records => {
            for fields in records {
                write_map(out, "item", fields);
            }
        }
        Some(records) => {
            for fields in records {
                write_struct(out, "item", fields);
            }
        }
        None => {
            for item in items {
                write_value(out, "item", item, map_records);
            }
        }
    }
    let _ = write!(out, "</{tag}>");
}

fn is_integer(value: &EncodableValue) -> bool {
    match value {
        EncodableValue::Int(_) => true,
        EncodableValue::Double(number) => is_integral(*number),
        _ => false,
    }
}

fn is_integral(number: f64) -> bool {
    number.is_finite() && number.fract() == 0.0
}

fn double_text(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number == f64::INFINITY {
        "INF".to_string()
    } else if number == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{MapEncodingPolicy, encode, encode_with};
    use crate::core::value::{EncodableScalar, EncodableValue};

    #[test]
    fn scalars_use_their_xsd_types() {
        assert_eq!(encode(&EncodableValue::Null), r#"<item xsi:nil="true"/>"#);
        assert_eq!(
            encode(&EncodableValue::Bool(true)),
            r#"<item xsi:type="xsd:boolean">true</item>"#
        );
        assert_eq!(
            encode(&EncodableValue::Int(-3)),
            r#"<item xsi:type="xsd:int">-3</item>"#
        );
        assert_eq!(
            encode(&EncodableValue::Double(3.14)),
            r#"<item xsi:type="xsd:double">3.14</item>"#
        );
        assert_eq!(
            encode(&EncodableValue::str("a<b")),
            r#"<item xsi:type="xsd:string">a&lt;b</item>"#
        );
    }

    #[test]
    fn integral_doubles_encode_as_int() {
        assert_eq!(
            encode(&EncodableValue::Double(3.0)),
            r#"<item xsi:type="xsd:int">3</item>"#
        );
    }

    #[test]
    fn non_finite_doubles_use_xsd_lexical_forms() {
        assert_eq!(
            encode(&EncodableValue::Double(f64::NEG_INFINITY)),
            r#"<item xsi:type="xsd:double">-INF</item>"#
        );
        assert_eq!(
            encode(&EncodableValue::Double(f64::NAN)),
            r#"<item xsi:type="xsd:double">NaN</item>"#
        );
    }

    #[test]
    fn standalone_record_is_a_struct() {
        let record = EncodableValue::record([
            ("to", EncodableScalar::str("a@x.com")),
            ("retries", EncodableScalar::Int(2)),
            ("cc", EncodableScalar::Null),
        ]);
        assert_eq!(
            encode(&record),
            concat!(
                r#"<item xsi:type="SOAP-ENC:Struct">"#,
                r#"<to xsi:type="xsd:string">a@x.com</to>"#,
                r#"<retries xsi:type="xsd:int">2</retries>"#,
                r#"<cc xsi:nil="true"/>"#,
                "</item>"
            )
        );
    }

    #[test]
    fn record_array_switches_to_map_items() {
        let value = EncodableValue::Array(vec![EncodableValue::record([(
            "subject",
            EncodableScalar::str("Hi"),
        )])]);
        assert_eq!(
            encode_with(&value, true),
            concat!(
                r#"<item SOAP-ENC:arrayType="ns2:Map[1]" xsi:type="SOAP-ENC:Array">"#,
                r#"<item xsi:type="ns2:Map"><item>"#,
                r#"<key xsi:type="xsd:string">subject</key>"#,
                r#"<value xsi:type="xsd:string">Hi</value>"#,
                "</item></item></item>"
            )
        );
    }

    #[test]
    fn mixed_array_declares_string_but_keeps_element_types() {
        let value = EncodableValue::Array(vec![EncodableValue::Int(1), EncodableValue::str("x")]);
        assert_eq!(
            encode(&value),
            concat!(
                r#"<item SOAP-ENC:arrayType="xsd:string[2]" xsi:type="SOAP-ENC:Array">"#,
                r#"<item xsi:type="xsd:int">1</item>"#,
                r#"<item xsi:type="xsd:string">x</item>"#,
                "</item>"
            )
        );
    }

    #[test]
    fn empty_array_is_an_int_array() {
        assert_eq!(
            encode(&EncodableValue::Array(Vec::new())),
            r#"<item SOAP-ENC:arrayType="xsd:int[0]" xsi:type="SOAP-ENC:Array"></item>"#
        );
    }

    #[test]
    fn policy_matches_exact_method_names() {
        let policy: MapEncodingPolicy = ["sendBatchMap"].into_iter().collect();
        assert!(policy.uses_map_encoding("sendBatchMap"));
        assert!(!policy.uses_map_encoding("sendbatchmap"));
        assert!(!MapEncodingPolicy::new().uses_map_encoding("sendBatchMap"));
    }
}
