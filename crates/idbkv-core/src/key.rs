//! Record keys.
//!
//! Keys follow the host engine's key model: numbers, dates, strings, binary
//! blobs and arrays of keys. Ordering across types is fixed by the host:
//! `Number < Date < String < Binary < Array`.

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::value::Value;

/// A record key.
///
/// Construct numeric keys with [`Key::number`] (or the integer `From`
/// conversions) so NaN never reaches a store. 64-bit integers go through
/// `TryFrom`, which rejects values beyond [`MAX_SAFE_INTEGER`].
#[derive(Clone, Serialize, Deserialize)]
pub enum Key {
    /// A finite or infinite number. Never NaN.
    Number(f64),
    /// Milliseconds since the Unix epoch.
    Date(f64),
    /// A string, compared by UTF-16 code units.
    String(String),
    /// A binary blob, compared bytewise.
    Binary(Bytes),
    /// An array of keys, compared element-wise.
    Array(Vec<Key>),
}

impl Key {
    /// Create a numeric key, rejecting NaN.
    pub fn number(n: f64) -> Result<Self> {
        if n.is_nan() {
            return Err(CoreError::InvalidKey("NaN is not a valid key".into()));
        }
        Ok(Key::Number(n))
    }

    /// Create a date key from milliseconds since the epoch, rejecting NaN.
    pub fn date(millis: f64) -> Result<Self> {
        if millis.is_nan() {
            return Err(CoreError::InvalidKey("invalid date".into()));
        }
        Ok(Key::Date(millis))
    }

    /// Build a key from a record value.
    ///
    /// Numbers, strings, bytes and arrays of those are valid keys. Objects,
    /// booleans and null are not.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => Key::number(*n),
            Value::String(s) => Ok(Key::String(s.clone())),
            Value::Bytes(b) => Ok(Key::Binary(b.clone())),
            Value::Array(items) => items
                .iter()
                .map(Key::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Key::Array),
            other => Err(CoreError::NotAKey(other.type_name().to_string())),
        }
    }

    /// Convert the key into the equivalent record value.
    ///
    /// Dates become their millisecond timestamp.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Number(n) | Key::Date(n) => Value::Number(*n),
            Key::String(s) => Value::String(s.clone()),
            Key::Binary(b) => Value::Bytes(b.clone()),
            Key::Array(items) => Value::Array(items.iter().map(Key::to_value).collect()),
        }
    }

    /// Borrow the string if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }

    /// Rank of the key type in the host's cross-type ordering.
    fn type_rank(&self) -> u8 {
        match self {
            Key::Number(_) => 0,
            Key::Date(_) => 1,
            Key::String(_) => 2,
            Key::Binary(_) => 3,
            Key::Array(_) => 4,
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    // -0 and +0 are the same key; NaN is rejected at construction.
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Number(a), Key::Number(b)) | (Key::Date(a), Key::Date(b)) => cmp_f64(*a, *b),
            (Key::String(a), Key::String(b)) => a.encode_utf16().cmp(b.encode_utf16()),
            (Key::Binary(a), Key::Binary(b)) => a.as_ref().cmp(b.as_ref()),
            (Key::Array(a), Key::Array(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Number(n) => write!(f, "Number({n})"),
            Key::Date(ms) => write!(f, "Date({ms})"),
            Key::String(s) => write!(f, "String({s:?})"),
            Key::Binary(b) => write!(f, "Binary({})", hex::encode(b)),
            Key::Array(items) => f.debug_tuple("Array").field(items).finish(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Number(n) => write!(f, "{n}"),
            Key::Date(ms) => write!(f, "Date({ms})"),
            Key::String(s) => f.write_str(s),
            Key::Binary(b) => f.write_str(&hex::encode(b)),
            Key::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::String(s.clone())
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(n: $t) -> Self {
                    Key::Number(n as f64)
                }
            }
        )*
    };
}

key_from_int!(i8, i16, i32, u8, u16, u32);

/// Largest integer a numeric key holds exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

// Wider integers only convert when they survive the trip through `f64`.
macro_rules! key_try_from_int {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Key {
                type Error = CoreError;

                fn try_from(n: $t) -> Result<Self> {
                    if (n as i128).abs() > i128::from(MAX_SAFE_INTEGER) {
                        return Err(CoreError::InvalidKey(format!(
                            "{n} is beyond the exact integer range of a numeric key"
                        )));
                    }
                    Ok(Key::Number(n as f64))
                }
            }
        )*
    };
}

key_try_from_int!(i64, u64, usize);

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Key::Binary(b)
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Key::Binary(Bytes::from(b))
    }
}

impl From<Vec<Key>> for Key {
    fn from(items: Vec<Key>) -> Self {
        Key::Array(items)
    }
}
