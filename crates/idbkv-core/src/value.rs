//! Record values.
//!
//! [`Value`] is the subset of the host's structured-clone data that idbkv
//! round-trips: JSON-like data plus binary buffers.
//!
//! With serde, values use their natural JSON shape except binary buffers,
//! which are written as `{"$bytes": "<hex>"}` so they read back as bytes
//! rather than as an array of numbers. An object whose only field is a valid
//! `$bytes` hex string therefore reads back as a buffer.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A stored record value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    // Tried before `Object` when deserializing.
    #[serde(with = "tagged_bytes")]
    Bytes(Bytes),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

mod tagged_bytes {
    use bytes::Bytes;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    const TAG: &str = "$bytes";

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Tagged {
        #[serde(rename = "$bytes")]
        hex: String,
    }

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(TAG, &hex::encode(bytes))?;
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let tagged = Tagged::deserialize(deserializer)?;
        hex::decode(&tagged.hex)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

impl Value {
    /// Build an object from `(field, value)` pairs.
    pub fn object<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Borrow the fields if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Borrow the buffer if this is binary data.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    /// Binary buffers become arrays of byte values; non-finite numbers become null.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(fields) => {
                serde_json::Value::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({ "a": 1, "b": [true, null], "c": "x" }));
        let fields = value.as_object().unwrap();
        assert_eq!(fields["a"], Value::Number(1.0));
        assert_eq!(
            fields["b"],
            Value::Array(vec![Value::Bool(true), Value::Null])
        );
        assert_eq!(fields["c"], Value::from("x"));
    }

    #[test]
    fn test_object_builder() {
        let built = Value::object([("name", "fast")]);
        assert_eq!(built, Value::from(json!({ "name": "fast" })));
    }

    #[test]
    fn test_bytes_to_json() {
        let value = Value::from(vec![1u8, 2, 3, 4]);
        assert_eq!(serde_json::Value::from(value), json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_bytes_serde_stay_bytes() {
        let value = Value::object([("blob", Value::from(vec![0u8, 1, 254, 255]))]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"blob":{"$bytes":"0001feff"}}"#);

        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
        assert_eq!(
            back.as_object().unwrap()["blob"].as_bytes().map(|b| &b[..]),
            Some(&[0u8, 1, 254, 255][..])
        );

        // Not valid hex, or extra fields: stays an object.
        let odd: Value = serde_json::from_str(r#"{"$bytes":"zz"}"#).unwrap();
        assert!(odd.is_object());
        let wide: Value = serde_json::from_str(r#"{"$bytes":"00","n":1}"#).unwrap();
        assert!(wide.is_object());

        // Arrays of numbers stay arrays.
        let numbers: Value = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(numbers, Value::from(json!([1, 2])));
    }

    #[test]
    fn test_serde_untagged() {
        let value: Value = serde_json::from_str(r#"{"a":{"b":2}}"#).unwrap();
        assert_eq!(value, Value::from(json!({ "a": { "b": 2 } })));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":{"b":2.0}}"#);
    }
}
