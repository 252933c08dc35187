//! Error types for tool registration and dispatch.

use apiscope_protocol::CallToolResult;
use thiserror::Error;

/// Registration-time failure: the argument type cannot describe a tool.
///
/// This is a programming mistake, surfaced when a tool is built. It never
/// occurs while serving calls.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The argument type does not derive to an object schema.
    #[error("argument type `{type_name}` must be a struct with named fields, found schema type `{found}`")]
    NotAnObject {
        /// Schema name of the offending type.
        type_name: String,
        /// The schema `type` that was derived instead.
        found: String,
    },

    /// The derived schema could not be converted to JSON.
    #[error("failed to serialize schema for `{type_name}`: {source}")]
    Serialize {
        /// Schema name of the offending type.
        type_name: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime failures during a tool call.
///
/// All variants except [`NotFound`](Self::NotFound) are converted into an
/// error-shaped [`CallToolResult`] before reaching the protocol layer.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The raw arguments do not fit the tool's argument type.
    #[error("invalid arguments: {0}")]
    Coercion(String),

    /// The handler reported a failure; the message is passed through verbatim.
    #[error("{0}")]
    Handler(String),

    /// The handler's result could not be serialized.
    #[error("failed to serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No tool is registered under the requested name.
    #[error("Unknown tool: {0}")]
    NotFound(String),
}

impl ToolError {
    /// Creates a [`Coercion`](Self::Coercion) error.
    pub fn coercion(msg: impl Into<String>) -> Self {
        Self::Coercion(msg.into())
    }

    /// Creates a [`Handler`](Self::Handler) error.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Creates a [`NotFound`](Self::NotFound) error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Converts this error into an error-shaped tool result.
    #[must_use]
    pub fn into_result(self) -> CallToolResult {
        CallToolResult::error(self.to_string())
    }
}

impl From<ToolError> for CallToolResult {
    fn from(err: ToolError) -> Self {
        err.into_result()
    }
}
