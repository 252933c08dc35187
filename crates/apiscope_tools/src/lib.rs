//! Generic tool adapter for apiscope.
//!
//! This crate turns ordinary typed async functions into tools a protocol
//! server can list and call. For each handler it derives a JSON input schema
//! from the argument type, coerces untyped argument bags into that type, and
//! normalizes whatever the handler returns into one [`CallToolResult`].
//!
//! # Quick Start
//!
//! ```ignore
//! use apiscope_tools::{CallContext, ToolRegistry, must_tool};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct LookupArgs {
//!     /// Key to look up.
//!     key: String,
//! }
//!
//! async fn lookup(_ctx: CallContext, args: LookupArgs) -> Result<&'static str, String> {
//!     if args.key == "a" { Ok("found") } else { Err(format!("no entry for {}", args.key)) }
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(must_tool("Lookup", "Look up one entry by key.", lookup));
//! ```
//!
//! # Architecture
//!
//! - [`Tool`]: trait for invocable, self-describing tools
//! - [`FunctionTool`] / [`must_tool`]: adapter for typed handlers
//! - [`Toolset`]: groups of tools sharing state
//! - [`ToolRegistry`]: stores and dispatches tools
//! - [`ArgumentShape`] / [`FieldInfo`]: schema derivation
//! - [`IntoToolResult`] / [`StructuredResult`] / [`Json`]: result normalization
//!
//! [`CallToolResult`]: apiscope_protocol::CallToolResult

pub mod coerce;
pub mod context;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod schema;
pub mod tool;
pub mod toolset;

pub use coerce::coerce;
pub use context::CallContext;
pub use error::{SchemaError, ToolError};
pub use normalize::{IntoToolResult, Json, ResultKind, StructuredResult, normalize};
pub use registry::ToolRegistry;
pub use schema::{ArgumentShape, FieldInfo, derive_input_schema};
pub use tool::{FunctionTool, Tool, must_tool};
pub use toolset::Toolset;
