//! Conversion of untyped argument bags into typed argument records.

use crate::error::ToolError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Converts a caller-supplied argument bag into `A`.
///
/// The bag is borrowed and left untouched; the returned value is freshly
/// allocated. An absent or `null` bag is treated as an empty object, so tools
/// whose arguments are all optional can be called without arguments.
///
/// Keys that `A` does not declare are ignored. Missing required keys are
/// reported by the deserializer, not by a separate pre-check.
///
/// # Errors
///
/// Returns [`ToolError::Coercion`] if the bag is not an object or does not
/// structurally match `A`.
pub fn coerce<A: DeserializeOwned>(raw: Option<&Value>) -> Result<A, ToolError> {
    let empty = Value::Object(serde_json::Map::new());
    let bag = match raw {
        None | Some(Value::Null) => &empty,
        Some(bag @ Value::Object(_)) => bag,
        Some(other) => {
            return Err(ToolError::coercion(format!(
                "arguments must be an object, got {}",
                kind_of(other)
            )));
        }
    };

    let encoded = serde_json::to_vec(bag).map_err(|err| ToolError::coercion(err.to_string()))?;
    serde_json::from_slice(&encoded).map_err(|err| ToolError::coercion(err.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Lookup {
        key: String,
        max_depth: Option<u32>,
    }

    #[test]
    fn fields_are_copied_by_wire_name() {
        let raw = json!({"key": "a", "maxDepth": 3});
        let args: Lookup = coerce(Some(&raw)).unwrap();
        assert_eq!(
            args,
            Lookup {
                key: "a".to_string(),
                max_depth: Some(3)
            }
        );
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let raw = json!({"key": "a", "extra": [1, 2, 3]});
        let args: Lookup = coerce(Some(&raw)).unwrap();
        assert_eq!(args.key, "a");
        assert_eq!(raw["extra"], json!([1, 2, 3]));
    }

    #[test]
    fn missing_required_key_fails() {
        let err = coerce::<Lookup>(Some(&json!({}))).unwrap_err();
        assert!(matches!(err, ToolError::Coercion(_)));
        assert!(err.to_string().contains("key"), "got: {err}");
    }

    #[test]
    fn type_mismatch_fails() {
        let err = coerce::<Lookup>(Some(&json!({"key": 42}))).unwrap_err();
        assert!(matches!(err, ToolError::Coercion(_)));
    }

    #[test]
    fn non_object_bag_fails() {
        let err = coerce::<Lookup>(Some(&json!(["key"]))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid arguments: arguments must be an object, got an array"
        );
    }

    #[test]
    fn absent_bag_is_an_empty_object() {
        #[derive(Debug, Deserialize)]
        struct NoArgs {}

        assert!(coerce::<NoArgs>(None).is_ok());
        assert!(coerce::<NoArgs>(Some(&Value::Null)).is_ok());
    }
}
