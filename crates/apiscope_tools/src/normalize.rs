//! Normalization of handler results into [`CallToolResult`].
//!
//! Handlers return whatever is natural for their domain. Each return type
//! resolves, through [`IntoToolResult`], into one of four [`ResultKind`]s, and
//! [`normalize`] turns that into the single wire shape:
//!
//! | Handler outcome | Response |
//! |-----------------|----------|
//! | `Err(e)` | error, one text block with `e.to_string()` |
//! | [`CallToolResult`] | passed through unchanged |
//! | `()`, `None`, empty collection, `null` | empty success |
//! | `String` / `&str` | one text block (empty string → empty success) |
//! | anything serializable | one text block with its JSON encoding |
//!
//! Domain types opt into JSON encoding with a one-line marker impl:
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct Summary { url: String }
//!
//! impl StructuredResult for Summary {}
//! ```
//!
//! or by being wrapped in [`Json`] at the return site.

use apiscope_protocol::CallToolResult;
use core::fmt;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::error::ToolError;

/// What a handler's successful return value means on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultKind {
    /// Already a protocol response.
    Passthrough(CallToolResult),
    /// Success with nothing to report.
    Nilish,
    /// Plain text.
    Text(String),
    /// The JSON encoding of a structured value.
    Serialized(String),
}

/// Conversion of a handler's return value into a [`ResultKind`].
pub trait IntoToolResult {
    /// Resolves this value.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if a structured value cannot be encoded.
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error>;
}

/// Marker for domain types that are returned as their JSON encoding.
pub trait StructuredResult: Serialize {}

/// Wraps any serializable value so it is returned as its JSON encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

/// Funnels a handler outcome into exactly one [`CallToolResult`].
///
/// Never fails: handler errors and serialization failures both become
/// error-shaped results.
pub fn normalize<R, E>(outcome: Result<R, E>) -> CallToolResult
where
    R: IntoToolResult,
    E: fmt::Display,
{
    let value = match outcome {
        Ok(value) => value,
        Err(err) => return CallToolResult::error(err.to_string()),
    };

    match value.into_result_kind() {
        Ok(ResultKind::Passthrough(result)) => result,
        Ok(ResultKind::Nilish) => CallToolResult::empty(),
        Ok(ResultKind::Text(text)) if text.is_empty() => CallToolResult::empty(),
        Ok(ResultKind::Text(text) | ResultKind::Serialized(text)) => CallToolResult::text(text),
        Err(err) => {
            tracing::warn!(error = %err, "tool result could not be serialized");
            ToolError::Serialization(err).into_result()
        }
    }
}

fn serialized<T: Serialize + ?Sized>(value: &T) -> Result<ResultKind, serde_json::Error> {
    serde_json::to_string(value).map(ResultKind::Serialized)
}

// ─────────────────────────────────────────────────────────────────────
// Pass-through
// ─────────────────────────────────────────────────────────────────────

impl IntoToolResult for CallToolResult {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Passthrough(self))
    }
}

impl IntoToolResult for Box<CallToolResult> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Passthrough(*self))
    }
}

impl IntoToolResult for &CallToolResult {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Passthrough(self.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Nil-like and text
// ─────────────────────────────────────────────────────────────────────

impl IntoToolResult for () {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Nilish)
    }
}

impl<T: IntoToolResult> IntoToolResult for Option<T> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        match self {
            Some(value) => value.into_result_kind(),
            None => Ok(ResultKind::Nilish),
        }
    }
}

impl IntoToolResult for String {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Text(self))
    }
}

impl IntoToolResult for &str {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Text(self.to_string()))
    }
}

impl IntoToolResult for Box<str> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Text(self.into_string()))
    }
}

impl IntoToolResult for Cow<'_, str> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        Ok(ResultKind::Text(self.into_owned()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Structured values
// ─────────────────────────────────────────────────────────────────────

impl IntoToolResult for Value {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        match self {
            Value::Null => Ok(ResultKind::Nilish),
            Value::String(text) => Ok(ResultKind::Text(text)),
            Value::Array(items) if items.is_empty() => Ok(ResultKind::Nilish),
            Value::Object(map) if map.is_empty() => Ok(ResultKind::Nilish),
            other => serialized(&other),
        }
    }
}

impl<T: Serialize> IntoToolResult for Vec<T> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        if self.is_empty() {
            return Ok(ResultKind::Nilish);
        }
        serialized(&self)
    }
}

impl<K: Serialize, V: Serialize> IntoToolResult for BTreeMap<K, V> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        if self.is_empty() {
            return Ok(ResultKind::Nilish);
        }
        serialized(&self)
    }
}

impl<K, V, S> IntoToolResult for HashMap<K, V, S>
where
    HashMap<K, V, S>: Serialize,
{
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        if self.is_empty() {
            return Ok(ResultKind::Nilish);
        }
        serialized(&self)
    }
}

impl<K, V, S> IntoToolResult for IndexMap<K, V, S>
where
    IndexMap<K, V, S>: Serialize,
{
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        if self.is_empty() {
            return Ok(ResultKind::Nilish);
        }
        serialized(&self)
    }
}

impl<T: Serialize> IntoToolResult for Json<T> {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        serialized(&self.0)
    }
}

impl<T: StructuredResult> IntoToolResult for T {
    fn into_result_kind(self) -> Result<ResultKind, serde_json::Error> {
        serialized(&self)
    }
}
