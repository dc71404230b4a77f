//! Conversions between idbkv keys/values and host values.

use std::collections::BTreeMap;

use bytes::Bytes;
use js_sys::{Array, ArrayBuffer, Date, Object, Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::IdbKeyRange;

use idbkv_core::{Key, KeyQuery, KeyRange, Value};

use crate::error::{Result, StoreError};
use crate::idb::request::host_error;

fn bytes_to_buffer(bytes: &[u8]) -> JsValue {
    Uint8Array::from(bytes).buffer().into()
}

fn buffer_bytes(value: &JsValue) -> Option<Bytes> {
    if let Some(buffer) = value.dyn_ref::<ArrayBuffer>() {
        return Some(Bytes::from(Uint8Array::new(buffer).to_vec()));
    }
    value
        .dyn_ref::<Uint8Array>()
        .map(|view| Bytes::from(view.to_vec()))
}

pub(crate) fn key_to_js(key: &Key) -> JsValue {
    match key {
        Key::Number(n) => JsValue::from_f64(*n),
        Key::Date(millis) => Date::new(&JsValue::from_f64(*millis)).into(),
        Key::String(s) => JsValue::from_str(s),
        Key::Binary(b) => bytes_to_buffer(b),
        Key::Array(items) => items.iter().map(key_to_js).collect::<Array>().into(),
    }
}

pub(crate) fn key_from_js(value: &JsValue) -> Result<Key> {
    if let Some(n) = value.as_f64() {
        return Ok(Key::number(n)?);
    }
    if let Some(s) = value.as_string() {
        return Ok(Key::String(s));
    }
    if let Some(date) = value.dyn_ref::<Date>() {
        return Ok(Key::date(date.get_time())?);
    }
    if let Some(bytes) = buffer_bytes(value) {
        return Ok(Key::Binary(bytes));
    }
    if Array::is_array(value) {
        let items: Array = value.clone().unchecked_into();
        return items
            .iter()
            .map(|item| key_from_js(&item))
            .collect::<Result<Vec<_>>>()
            .map(Key::Array);
    }
    Err(StoreError::Conversion(format!(
        "unsupported key type: {value:?}"
    )))
}

pub(crate) fn value_to_js(value: &Value) -> Result<JsValue> {
    Ok(match value {
        Value::Null => JsValue::NULL,
        Value::Bool(b) => JsValue::from_bool(*b),
        Value::Number(n) => JsValue::from_f64(*n),
        Value::String(s) => JsValue::from_str(s),
        Value::Bytes(b) => bytes_to_buffer(b),
        Value::Array(items) => {
            let array = Array::new();
            for item in items {
                array.push(&value_to_js(item)?);
            }
            array.into()
        }
        Value::Object(fields) => {
            let object = Object::new();
            for (field, item) in fields {
                Reflect::set(&object, &JsValue::from_str(field), &value_to_js(item)?)
                    .map_err(host_error)?;
            }
            object.into()
        }
    })
}

pub(crate) fn value_from_js(value: &JsValue) -> Result<Value> {
    if value.is_null() || value.is_undefined() {
        return Ok(Value::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(n) = value.as_f64() {
        return Ok(Value::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s));
    }
    if let Some(bytes) = buffer_bytes(value) {
        return Ok(Value::Bytes(bytes));
    }
    if let Some(date) = value.dyn_ref::<Date>() {
        return Ok(Value::Number(date.get_time()));
    }
    if Array::is_array(value) {
        let items: Array = value.clone().unchecked_into();
        return items
            .iter()
            .map(|item| value_from_js(&item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }
    if value.is_object() {
        let object: &Object = value.unchecked_ref();
        let mut fields = BTreeMap::new();
        for field in Object::keys(object).iter() {
            let name = field
                .as_string()
                .ok_or_else(|| StoreError::Conversion("non-string field name".into()))?;
            let item = Reflect::get(object, &field).map_err(host_error)?;
            fields.insert(name, value_from_js(&item)?);
        }
        return Ok(Value::Object(fields));
    }
    Err(StoreError::Conversion(format!(
        "unsupported value type: {value:?}"
    )))
}

fn range_to_js(range: &KeyRange) -> Result<IdbKeyRange> {
    let lower = range.lower.as_ref().map(key_to_js);
    let upper = range.upper.as_ref().map(key_to_js);
    match (lower, upper) {
        (Some(lower), Some(upper)) => IdbKeyRange::bound_with_lower_open_and_upper_open(
            &lower,
            &upper,
            range.lower_open,
            range.upper_open,
        ),
        (Some(lower), None) => IdbKeyRange::lower_bound_with_open(&lower, range.lower_open),
        (None, Some(upper)) => IdbKeyRange::upper_bound_with_open(&upper, range.upper_open),
        (None, None) => {
            return Err(StoreError::Conversion(
                "unbounded key range has no host form".into(),
            ))
        }
    }
    .map_err(host_error)
}

/// Host form of a query, or `None` for "every record".
pub(crate) fn query_to_js(query: &KeyQuery) -> Result<Option<JsValue>> {
    match query {
        KeyQuery::All => Ok(None),
        KeyQuery::Key(key) => Ok(Some(key_to_js(key))),
        KeyQuery::Range(range) if range.lower.is_none() && range.upper.is_none() => Ok(None),
        KeyQuery::Range(range) => Ok(Some(range_to_js(range)?.into())),
    }
}
