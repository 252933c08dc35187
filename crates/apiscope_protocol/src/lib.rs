//! Wire types for the apiscope tool server.
//!
//! Everything that crosses the protocol boundary lives here: tool descriptors
//! with their input schemas, the normalized [`CallToolResult`] every tool call
//! resolves to, and the JSON-RPC 2.0 envelope carrying them.
//!
//! # Architecture
//!
//! - [`tool`]: [`ToolDescriptor`], [`InputSchema`], `tools/list` and `tools/call` payloads
//! - [`content`]: [`CallToolResult`] and its [`ContentBlock`]s
//! - [`jsonrpc`]: request/response/error envelope
//! - [`lifecycle`]: `initialize` handshake

pub mod content;
pub mod jsonrpc;
pub mod lifecycle;
pub mod tool;

pub use content::{CallToolResult, ContentBlock};
pub use jsonrpc::{JSON_RPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use lifecycle::{
    Implementation, InitializeParams, InitializeResult, LATEST_PROTOCOL_VERSION,
    ServerCapabilities, ToolsCapability, negotiate_protocol_version,
};
pub use tool::{CallToolParams, InputSchema, ListToolsResult, ToolDescriptor};
