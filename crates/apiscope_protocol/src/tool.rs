//! Tool descriptors and the `tools/*` method payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structural schema of a tool's single argument record.
///
/// Always an object schema. Property order is the declaration order of the
/// argument type's fields.
///
/// ```json
/// {
///   "type": "object",
///   "properties": {
///     "urlPath": {"type": "string", "description": "Route to look up"},
///     "method": {"type": "string", "enum": ["get", "post"]}
///   },
///   "required": ["urlPath", "method"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    /// JSON Schema type, always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property name to property schema.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Names of the required properties.
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

impl InputSchema {
    /// Returns the property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Returns whether the named property is required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|required| required == name)
    }
}

/// Caller-facing description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Stable, unique tool name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// Schema of the tool's arguments.
    pub input_schema: InputSchema,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// All registered tools, in registration order.
    pub tools: Vec<ToolDescriptor>,
}

/// Parameters of `tools/call`.
///
/// `arguments` is kept untyped; the target tool decides whether it fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Untyped argument bag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_uses_camel_case_input_schema() {
        let descriptor = ToolDescriptor {
            name: "Lookup".to_string(),
            description: "Look up a key.".to_string(),
            input_schema: InputSchema::default(),
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn call_params_accept_missing_arguments() {
        let params: CallToolParams = serde_json::from_str(r#"{"name":"Lookup"}"#).unwrap();
        assert_eq!(params.name, "Lookup");
        assert!(params.arguments.is_none());
    }
}
