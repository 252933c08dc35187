use super::{GET_SINGLE_API_DETAIL, loaded_document};
use apiscope_openapi::{DocumentStore, HttpMethod};
use apiscope_tools::{CallContext, Json, Tool, ToolError, must_tool};
use schemars::generate::SchemaGenerator;
use schemars::{JsonSchema, Schema, json_schema};
use serde::Deserialize;
use std::sync::Arc;

/// Arguments of [`GET_SINGLE_API_DETAIL`].
///
/// `method` stays a string so that any casing is accepted and values outside
/// the enumeration are reported by the document lookup itself.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiDetailArgs {
    /// The route url path you want to look up, e.g. /pets/{id}.
    pub url_path: String,
    /// HTTP method of the operation on that url path.
    #[schemars(schema_with = "method_schema")]
    pub method: String,
}

fn method_schema(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "string",
        "enum": HttpMethod::labels(),
    })
}

pub(super) fn tool(store: Arc<DocumentStore>) -> impl Tool {
    must_tool(
        GET_SINGLE_API_DETAIL,
        format!("{GET_SINGLE_API_DETAIL} will return the details of one method of a url path"),
        move |_ctx: CallContext, args: ApiDetailArgs| {
            let operation = loaded_document(&store).and_then(|loaded| {
                loaded
                    .document
                    .get_entry(&args.url_path, &args.method)
                    .cloned()
                    .map_err(|err| ToolError::handler(err.to_string()))
            });
            async move { operation.map(Json) }
        },
    )
}
