//! The tools this server ships with.
//!
//! | Tool | Arguments | Result |
//! |------|-----------|--------|
//! | [`READ_OPENAPI_DOCUMENT`] | `openAPIPath` | `success` |
//! | [`LIST_ALL_API_FROM_DOCUMENT`] | none | every path and its methods |
//! | [`GET_SINGLE_API_DETAIL`] | `urlPath`, `method` | one operation |
//! | [`SEND_API_REQUEST`] | request description | status, headers and body |
//!
//! The first three share a [`DocumentStore`]; the document must be read
//! before it can be listed or queried.

mod api_detail;
mod list_apis;
mod read_document;
mod send_request;

pub use api_detail::ApiDetailArgs;
pub use read_document::ReadDocumentArgs;

use crate::http::HttpClient;
use apiscope_openapi::{DocumentError, DocumentStore, LoadedDocument};
use apiscope_tools::{Tool, ToolError, Toolset};
use std::sync::Arc;

/// Name of the tool that loads a document.
pub const READ_OPENAPI_DOCUMENT: &str = "ReadOpenAPIDocument";
/// Name of the tool that lists every path.
pub const LIST_ALL_API_FROM_DOCUMENT: &str = "ListAllAPIFromDocument";
/// Name of the tool that returns one operation.
pub const GET_SINGLE_API_DETAIL: &str = "GetSingleAPIDetail";
/// Name of the tool that sends an HTTP request.
pub const SEND_API_REQUEST: &str = "SendAPIRequest";

/// Document inspection tools sharing one [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct OpenApiTools {
    store: Arc<DocumentStore>,
}

impl OpenApiTools {
    /// Creates the toolset over `store`.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

impl Toolset for OpenApiTools {
    fn tools(self) -> Vec<Box<dyn Tool>> {
        vec![
            Box::new(read_document::tool(Arc::clone(&self.store))),
            Box::new(list_apis::tool(Arc::clone(&self.store))),
            Box::new(api_detail::tool(self.store)),
        ]
    }
}

/// The HTTP request tool.
#[derive(Debug, Clone)]
pub struct HttpTools {
    client: HttpClient,
}

impl HttpTools {
    /// Creates the toolset over `client`.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Toolset for HttpTools {
    fn tools(self) -> Vec<Box<dyn Tool>> {
        vec![Box::new(send_request::tool(self.client))]
    }
}

/// Snapshot of the loaded document, or a message telling the caller what to do.
fn loaded_document(store: &DocumentStore) -> Result<Arc<LoadedDocument>, ToolError> {
    store.current().map_err(|err| match err {
        DocumentError::NotLoaded => ToolError::handler(format!(
            "OpenAPI document has not been read; call {READ_OPENAPI_DOCUMENT:?} first"
        )),
        other => ToolError::handler(other.to_string()),
    })
}
