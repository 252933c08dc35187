//! Typed tools for inspecting OpenAPI documents over JSON-RPC.

/// Wire types shared by every layer.
pub use apiscope_protocol;

/// Generic adapter between typed handler functions and the protocol.
pub use apiscope_tools;

/// OpenAPI v3 document model and the loaded-document store.
pub use apiscope_openapi;

/// JSON-RPC dispatcher, stdio transport and the bundled tools.
pub use apiscope_server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use apiscope_protocol::{CallToolResult, ContentBlock, InputSchema, ToolDescriptor};
    pub use apiscope_tools::{
        CallContext, IntoToolResult, Json, StructuredResult, Tool, ToolError, ToolRegistry,
        Toolset, must_tool,
    };
}
