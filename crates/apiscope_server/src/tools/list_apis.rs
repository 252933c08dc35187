use super::{LIST_ALL_API_FROM_DOCUMENT, READ_OPENAPI_DOCUMENT, loaded_document};
use apiscope_openapi::DocumentStore;
use apiscope_tools::{CallContext, Tool, ToolError, must_tool};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct ListApisArgs {}

pub(super) fn tool(store: Arc<DocumentStore>) -> impl Tool {
    must_tool(
        LIST_ALL_API_FROM_DOCUMENT,
        format!(
            "{LIST_ALL_API_FROM_DOCUMENT} will list every API path and its methods from the \
             OpenAPI document. Use {READ_OPENAPI_DOCUMENT:?} to load the document first."
        ),
        move |_ctx: CallContext, _args: ListApisArgs| {
            let loaded = loaded_document(&store);
            async move { Ok::<_, ToolError>(loaded?.document.list_entries()) }
        },
    )
}
