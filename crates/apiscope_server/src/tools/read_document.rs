use super::READ_OPENAPI_DOCUMENT;
use apiscope_openapi::{DocumentError, DocumentStore};
use apiscope_protocol::CallToolResult;
use apiscope_tools::{CallContext, Tool, must_tool};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Arguments of [`READ_OPENAPI_DOCUMENT`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadDocumentArgs {
    /// The path that leads to an OpenAPI YAML or JSON file; try an absolute path if a relative one does not work.
    #[serde(rename = "openAPIPath")]
    pub open_api_path: String,
}

pub(super) fn tool(store: Arc<DocumentStore>) -> impl Tool {
    must_tool(
        READ_OPENAPI_DOCUMENT,
        format!(
            "{READ_OPENAPI_DOCUMENT} will read an OpenAPI file from the given path. \
             Run this tool first to load the document before using the other tools."
        ),
        move |_ctx: CallContext, args: ReadDocumentArgs| {
            let store = Arc::clone(&store);
            async move {
                store.load(&args.open_api_path).await?;
                Ok::<_, DocumentError>(CallToolResult::text("success"))
            }
        },
    )
}
