//! Purpose: Value models for the wire codec: precise on the way out, inferred on the way in.
//! Exports: `EncodableScalar`, `EncodableValue`, `Record`, `DecodedValue`, `Object`.
//! Role: Transient per-call/per-response values; no shared state.
//! Invariants: Record fields hold scalars only (the remote protocol never nests records there).
//! Invariants: Typed accessors fail with `ErrorKind::UnexpectedShape`, never a silent default.
use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};

use super::error::{Error, ErrorKind};

/// Field order is preserved so encoding stays deterministic.
pub type Record = Vec<(String, EncodableScalar)>;

pub type Object = BTreeMap<String, DecodedValue>;

#[derive(Clone, Debug, PartialEq)]
pub enum EncodableScalar {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EncodableValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(Vec<EncodableValue>),
    Record(Record),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DecodedValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<DecodedValue>),
    Object(Object),
}

impl EncodableScalar {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }
}

impl From<EncodableScalar> for EncodableValue {
    fn from(scalar: EncodableScalar) -> Self {
        match scalar {
            EncodableScalar::Null => Self::Null,
            EncodableScalar::Bool(value) => Self::Bool(value),
            EncodableScalar::Int(value) => Self::Int(value),
            EncodableScalar::Double(value) => Self::Double(value),
            EncodableScalar::Str(value) => Self::Str(value),
        }
    }
}

impl EncodableValue {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Builds a record from `(field, scalar)` pairs, keeping their order.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, EncodableScalar)>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Converts a JSON value. Objects become records and must hold scalar fields only.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => {
                let mut record = Record::with_capacity(map.len());
                for (key, field) in map {
                    let scalar = scalar_from_json(field).ok_or_else(|| {
                        Error::new(ErrorKind::Usage)
                            .with_message(format!("record field '{key}' must be a scalar"))
                            .with_hint("Nested objects and arrays are not allowed inside records.")
                    })?;
                    record.push((key.clone(), scalar));
                }
                Ok(Self::Record(record))
            }
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            scalar => scalar_from_json(scalar).map(Self::from).ok_or_else(|| {
                Error::new(ErrorKind::Internal).with_message("unhandled json value")
            }),
        }
    }
}

fn scalar_from_json(value: &Value) -> Option<EncodableScalar> {
    match value {
        Value::Null => Some(EncodableScalar::Null),
        Value::Bool(flag) => Some(EncodableScalar::Bool(*flag)),
        Value::Number(number) => Some(match number.as_i64() {
            Some(int) => EncodableScalar::Int(int),
            None => EncodableScalar::Double(number.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(text) => Some(EncodableScalar::Str(text.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

impl DecodedValue {
    fn shape(&self) -> &'static str {
        match self {
            DecodedValue::Null => "null",
            DecodedValue::Bool(_) => "bool",
            DecodedValue::Number(_) => "number",
            DecodedValue::Str(_) => "string",
            DecodedValue::List(_) => "list",
            DecodedValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            DecodedValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&DecodedValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn require_bool(&self) -> Result<bool, Error> {
        self.as_bool().ok_or_else(|| self.shape_error("bool"))
    }

    pub fn require_f64(&self) -> Result<f64, Error> {
        self.as_f64().ok_or_else(|| self.shape_error("number"))
    }

    /// Accepts integral numbers only.
    pub fn require_i64(&self) -> Result<i64, Error> {
        self.as_f64()
            .and_then(integral)
            .ok_or_else(|| self.shape_error("integer"))
    }

    pub fn require_str(&self) -> Result<&str, Error> {
        self.as_str().ok_or_else(|| self.shape_error("string"))
    }

    pub fn require_list(&self) -> Result<&[DecodedValue], Error> {
        self.as_list().ok_or_else(|| self.shape_error("list"))
    }

    pub fn require_object(&self) -> Result<&Object, Error> {
        self.as_object().ok_or_else(|| self.shape_error("object"))
    }

    /// Requires an object holding `key`.
    pub fn field(&self, key: &str) -> Result<&DecodedValue, Error> {
        self.require_object()?.get(key).ok_or_else(|| {
            Error::new(ErrorKind::UnexpectedShape).with_message(format!("missing field '{key}'"))
        })
    }

    fn shape_error(&self, expected: &str) -> Error {
        Error::new(ErrorKind::UnexpectedShape)
            .with_message(format!("expected {expected}, found {}", self.shape()))
    }

    /// Renders as JSON; integral numbers become JSON integers.
    pub fn to_json(&self) -> Value {
        match self {
            DecodedValue::Null => Value::Null,
            DecodedValue::Bool(flag) => Value::Bool(*flag),
            DecodedValue::Number(number) => match integral(*number) {
                Some(int) => Value::from(int),
                None => Number::from_f64(*number).map_or(Value::Null, Value::Number),
            },
            DecodedValue::Str(text) => Value::String(text.clone()),
            DecodedValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            DecodedValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

fn integral(number: f64) -> Option<i64> {
    if number.fract() == 0.0 && number.abs() < 9.2e18 {
        Some(number as i64)
    } else {
        None
    }
}

impl From<Value> for DecodedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DecodedValue::Null,
            Value::Bool(flag) => DecodedValue::Bool(flag),
            Value::Number(number) => DecodedValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(text) => DecodedValue::Str(text),
            Value::Array(items) => DecodedValue::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => DecodedValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Null => serializer.serialize_unit(),
            DecodedValue::Bool(flag) => serializer.serialize_bool(*flag),
            DecodedValue::Number(number) => match integral(*number) {
                Some(int) => serializer.serialize_i64(int),
                None => serializer.serialize_f64(*number),
            },
            DecodedValue::Str(text) => serializer.serialize_str(text),
            DecodedValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DecodedValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}
