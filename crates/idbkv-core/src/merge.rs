//! Shallow merge used by `update`.

use crate::value::Value;

/// Merge `patch` onto `existing`.
///
/// - No existing record: the patch is stored verbatim.
/// - Both objects: every top-level field of the patch is assigned over the
///   existing record. Nested objects are replaced, not merged.
/// - Anything else: the patch replaces the existing record.
pub fn shallow_merge(existing: Option<Value>, patch: Value) -> Value {
    match (existing, patch) {
        (Some(Value::Object(mut fields)), Value::Object(patch_fields)) => {
            fields.extend(patch_fields);
            Value::Object(fields)
        }
        (_, patch) => patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_absent_uses_patch() {
        assert_eq!(shallow_merge(None, v(json!({ "a": 1 }))), v(json!({ "a": 1 })));
    }

    #[test]
    fn test_object_merge() {
        let merged = shallow_merge(Some(v(json!({ "a": 1 }))), v(json!({ "b": 2 })));
        assert_eq!(merged, v(json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn test_patch_overwrites_fields() {
        let merged = shallow_merge(
            Some(v(json!({ "a": 1, "b": 1 }))),
            v(json!({ "b": 2 })),
        );
        assert_eq!(merged, v(json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn test_merge_is_shallow() {
        let merged = shallow_merge(
            Some(v(json!({ "nested": { "x": 1, "y": 1 } }))),
            v(json!({ "nested": { "y": 2 } })),
        );
        assert_eq!(merged, v(json!({ "nested": { "y": 2 } })));
    }

    #[test]
    fn test_non_object_replaced() {
        let merged = shallow_merge(Some(Value::from(5)), v(json!({ "a": 1 })));
        assert_eq!(merged, v(json!({ "a": 1 })));

        let merged = shallow_merge(Some(v(json!({ "a": 1 }))), Value::from("x"));
        assert_eq!(merged, Value::from("x"));
    }
}
