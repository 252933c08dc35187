//! Grouping of related tools.

use crate::tool::Tool;

/// A group of tools registered together.
///
/// Toolsets own whatever state their tools share (a document store, an HTTP
/// client) and hand out one boxed tool per operation.
pub trait Toolset {
    /// Returns the tools in this set, in registration order.
    fn tools(self) -> Vec<Box<dyn Tool>>;
}

impl Toolset for Vec<Box<dyn Tool>> {
    fn tools(self) -> Vec<Box<dyn Tool>> {
        self
    }
}
