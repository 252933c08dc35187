//! Schema derivation for tool argument types.
//!
//! [`ArgumentShape::of`] walks the JSON schema `schemars` derives for a tool's
//! argument struct and records one [`FieldInfo`] per field. Wire names come
//! from the same serde attributes the [coercer](crate::coerce) deserializes
//! with, so documentation and validation cannot drift apart.
//!
//! Field metadata is declared on the struct itself:
//!
//! ```ignore
//! #[derive(Deserialize, JsonSchema)]
//! #[serde(rename_all = "camelCase")]
//! struct DetailArgs {
//!     /// The route to look up.
//!     url_path: String,
//!     /// HTTP method.
//!     #[schemars(schema_with = "method_schema")]
//!     method: String,
//!     /// Optional, therefore not required.
//!     verbose: Option<bool>,
//! }
//! ```
//!
//! - doc comments become `description`
//! - `Option<T>` and `#[serde(default)]` fields are not required
//! - `enum` values come from unit-variant enums or a custom `schema_with`

use crate::error::SchemaError;
use apiscope_protocol::InputSchema;
use schemars::JsonSchema;
use schemars::generate::{SchemaGenerator, SchemaSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema information for a single field of an argument type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Wire name of the field.
    pub name: String,
    /// Field description (typically from doc comments).
    pub description: Option<String>,
    /// JSON Schema for this field's type.
    pub schema: Value,
    /// Whether callers must supply this field.
    pub required: bool,
    /// Enumerated allowed values; empty when unconstrained.
    pub allowed_values: Vec<Value>,
}

impl FieldInfo {
    /// Creates a new required field with the given wire name and schema.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        let description = schema
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let allowed_values = schema
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self {
            name: name.into(),
            description,
            schema,
            required: true,
            allowed_values,
        }
    }
}

/// The declared shape of a tool's single argument record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentShape {
    /// Schema name of the argument type.
    pub type_name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldInfo>,
}

impl ArgumentShape {
    /// Derives the shape of `A`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`] if `A` is not a struct with named
    /// fields (a string, a sequence, an enum, ...).
    pub fn of<A: JsonSchema>() -> Result<Self, SchemaError> {
        let type_name = A::schema_name().into_owned();
        let schema = schema_generator().into_root_schema_for::<A>();
        let value = serde_json::to_value(schema).map_err(|source| SchemaError::Serialize {
            type_name: type_name.clone(),
            source,
        })?;

        match value.get("type") {
            Some(Value::String(found)) if found == "object" => {}
            other => {
                return Err(SchemaError::NotAnObject {
                    type_name,
                    found: other.map_or_else(|| "none".to_string(), Value::to_string),
                });
            }
        }

        let required: Vec<&str> = value
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = value
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, schema)| {
                        let mut field = FieldInfo::new(name.as_str(), schema.clone());
                        field.required = required.contains(&name.as_str());
                        field
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { type_name, fields })
    }

    /// Returns a field by wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the wire names of the required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
    }

    /// Builds the caller-facing input schema.
    #[must_use]
    pub fn to_input_schema(&self) -> InputSchema {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut field_schema = field.schema.clone();
            if let Some(desc) = &field.description
                && let Some(obj) = field_schema.as_object_mut()
            {
                obj.insert("description".to_string(), Value::String(desc.clone()));
            }
            properties.insert(field.name.clone(), field_schema);

            if field.required {
                required.push(field.name.clone());
            }
        }

        InputSchema {
            schema_type: "object".to_string(),
            properties,
            required,
        }
    }
}

/// Derives the input schema of `A` in one step.
///
/// # Errors
///
/// See [`ArgumentShape::of`].
pub fn derive_input_schema<A: JsonSchema>() -> Result<InputSchema, SchemaError> {
    ArgumentShape::of::<A>().map(|shape| shape.to_input_schema())
}

/// Nested types are inlined so every property schema stands on its own.
fn schema_generator() -> SchemaGenerator {
    SchemaSettings::draft2020_12()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator()
}
