//! The [`Tool`] trait and the generic adapter for typed handler functions.

use crate::coerce::coerce;
use crate::context::CallContext;
use crate::error::SchemaError;
use crate::normalize::{IntoToolResult, normalize};
use crate::schema::ArgumentShape;
use apiscope_protocol::{CallToolResult, ToolDescriptor};
use core::fmt;
use core::marker::PhantomData;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// A named, independently invocable operation.
///
/// Implementations receive an untyped argument bag and must always resolve to
/// a [`CallToolResult`]; failures are reported inside the result.
pub trait Tool: Send + Sync + 'static {
    /// Returns the caller-facing descriptor.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Invokes the tool.
    fn call(
        &self,
        ctx: CallContext,
        args: Option<Value>,
    ) -> Pin<Box<dyn Future<Output = CallToolResult> + Send + '_>>;
}

/// Adapter binding a typed async handler to the [`Tool`] calling convention.
///
/// The handler takes a [`CallContext`] and one argument record `A`, and
/// returns `Result<R, E>`. At build time the input schema is derived from
/// `A`; at call time the argument bag is coerced into `A` (the handler never
/// runs on a malformed bag) and the outcome is [normalized](normalize).
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct LookupArgs {
///     /// Key to look up.
///     key: String,
/// }
///
/// async fn lookup(_ctx: CallContext, args: LookupArgs) -> Result<String, String> {
///     Ok(format!("found {}", args.key))
/// }
///
/// let tool = must_tool("Lookup", "Look up one entry by key.", lookup);
/// ```
pub struct FunctionTool<A, F> {
    descriptor: ToolDescriptor,
    handler: F,
    _args: PhantomData<fn(A)>,
}

impl<A, F> fmt::Debug for FunctionTool<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<A, F> FunctionTool<A, F> {
    /// Builds a tool from a handler.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if `A` is not a struct with named fields.
    pub fn new<Fut, R, E>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<Self, SchemaError>
    where
        A: JsonSchema + DeserializeOwned,
        F: Fn(CallContext, A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: IntoToolResult,
        E: fmt::Display,
    {
        let shape = ArgumentShape::of::<A>()?;
        Ok(Self {
            descriptor: ToolDescriptor {
                name: name.into(),
                description: description.into(),
                input_schema: shape.to_input_schema(),
            },
            handler,
            _args: PhantomData,
        })
    }
}

/// Builds a tool from a handler, panicking if its argument type is unusable.
///
/// # Panics
///
/// Panics if `A` is not a struct with named fields. This is a defect in the
/// tool's definition and surfaces as soon as the tool is built.
pub fn must_tool<A, F, Fut, R, E>(
    name: impl Into<String>,
    description: impl Into<String>,
    handler: F,
) -> FunctionTool<A, F>
where
    A: JsonSchema + DeserializeOwned,
    F: Fn(CallContext, A) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    R: IntoToolResult,
    E: fmt::Display,
{
    let name = name.into();
    match FunctionTool::new(name.clone(), description, handler) {
        Ok(tool) => tool,
        Err(err) => panic!("failed to build tool '{name}': {err}"),
    }
}

impl<A, F, Fut, R, E> Tool for FunctionTool<A, F>
where
    A: DeserializeOwned + 'static,
    F: Fn(CallContext, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoToolResult,
    E: fmt::Display,
{
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn call(
        &self,
        ctx: CallContext,
        args: Option<Value>,
    ) -> Pin<Box<dyn Future<Output = CallToolResult> + Send + '_>> {
        let name = self.descriptor.name.as_str();
        let args = match coerce::<A>(args.as_ref()) {
            Ok(args) => args,
            Err(err) => {
                tracing::debug!(tool = name, error = %err, "rejected tool arguments");
                return Box::pin(core::future::ready(err.into_result()));
            }
        };

        let pending = (self.handler)(ctx, args);
        Box::pin(async move {
            let result = normalize(pending.await);
            if result.is_error {
                tracing::debug!(tool = name, "tool handler reported an error");
            }
            result
        })
    }
}
