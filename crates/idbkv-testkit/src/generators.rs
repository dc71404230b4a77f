//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use bytes::Bytes;
use proptest::prelude::*;

use idbkv_core::{Key, Value};

/// Generate a number key. Never NaN.
pub fn number_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        any::<i32>().prop_map(|n| Key::Number(f64::from(n))),
        (-1e12f64..1e12).prop_map(Key::Number),
        Just(Key::Number(f64::INFINITY)),
        Just(Key::Number(f64::NEG_INFINITY)),
    ]
}

/// Generate a scalar key of any type.
pub fn scalar_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        number_key(),
        (0f64..4e12).prop_map(Key::Date),
        "\\PC{0,8}".prop_map(Key::String),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|b| Key::Binary(Bytes::from(b))),
    ]
}

/// Generate a key, including nested arrays.
pub fn key() -> impl Strategy<Value = Key> {
    scalar_key().prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Key::Array)
    })
}

/// Generate a scalar record value.
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(f64::from(n))),
        "[a-z]{0,8}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|b| Value::Bytes(Bytes::from(b))),
    ]
}

/// Generate a flat object with up to `max_fields` fields.
pub fn object_value(max_fields: usize) -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-e]", scalar_value(), 0..=max_fields)
        .prop_map(|fields: BTreeMap<String, Value>| Value::Object(fields))
}

/// Generate distinct integer keys in arbitrary order.
pub fn shuffled_keys(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_set(-1000i32..1000, 0..=max_len)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}
