//! Tool registry.
//!
//! The [`ToolRegistry`] stores registered tools and dispatches calls by name.
//! It is filled once while the server is being assembled and then frozen
//! behind an `Arc`; dispatch only needs `&self`, so concurrent calls never
//! contend on the registry.
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(must_tool("Lookup", "Look up one entry.", lookup));
//! registry.register_toolset(OpenApiTools::new(store));
//! let registry = Arc::new(registry);
//!
//! let result = registry.call("Lookup", CallContext::new(), Some(args)).await?;
//! ```

use crate::context::CallContext;
use crate::error::ToolError;
use crate::tool::Tool;
use crate::toolset::Toolset;
use apiscope_protocol::{CallToolResult, ToolDescriptor};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Registry of available tools.
///
/// Tools are kept in registration order, which is also the order
/// [`descriptors`](Self::descriptors) reports them in.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl core::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Registers a tool.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered.
    pub fn register(&mut self, tool: impl Tool) {
        self.insert(Arc::new(tool));
    }

    /// Registers all tools from a toolset.
    ///
    /// # Panics
    ///
    /// Panics if any tool name conflicts with an already-registered tool.
    pub fn register_toolset(&mut self, toolset: impl Toolset) {
        for tool in toolset.tools() {
            self.insert(Arc::from(tool));
        }
    }

    fn insert(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.descriptor().name.clone();
        assert!(
            !self.tools.contains_key(&name),
            "Tool '{name}' is already registered"
        );
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
    }

    /// Calls a tool by name.
    ///
    /// Handler failures are reported inside the returned [`CallToolResult`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if no tool has that name.
    pub async fn call(
        &self,
        name: &str,
        ctx: CallContext,
        args: Option<Value>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::not_found(name))?;
        Ok(tool.call(ctx, args).await)
    }

    /// Returns the descriptors of all registered tools.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| tool.descriptor().clone())
            .collect()
    }

    /// Returns a reference to a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(AsRef::as_ref)
    }

    /// Returns whether a tool with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the names of all registered tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
