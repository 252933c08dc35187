//! JSON-RPC tool server for OpenAPI documents.
//!
//! Wires the generic tool adapter to a protocol dispatcher, a stdio
//! transport and the bundled tools:
//!
//! ```ignore
//! let config = ServerConfig::from(Args::parse());
//! config.tracing.init();
//! let server = build_server(&config).await?;
//! serve_stdio(Arc::new(server)).await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod stdio;
pub mod tools;

pub use config::{Args, ServerConfig};
pub use error::ServerError;
pub use http::{ApiRequest, ApiResponse, HttpClient, HttpDefaults, HttpError};
pub use logging::{TracingConfig, TracingFormat};
pub use server::{DEFAULT_SHUTDOWN_GRACE, ToolServer, ToolServerBuilder};
pub use stdio::{serve, serve_stdio};
pub use tools::{HttpTools, OpenApiTools};

use apiscope_openapi::DocumentStore;
use std::sync::Arc;

/// Usage hints sent to clients in the `initialize` response.
pub const INSTRUCTIONS: &str = "Call ReadOpenAPIDocument with the path of an OpenAPI 3 file first. \
    Then use ListAllAPIFromDocument to see every path, GetSingleAPIDetail to inspect one \
    operation, and SendAPIRequest to call the API.";

/// Builds a server with every bundled tool, preloading the configured document.
///
/// # Errors
///
/// Returns [`ServerError`] if the document cannot be loaded or the HTTP client
/// cannot be built.
pub async fn build_server(config: &ServerConfig) -> Result<ToolServer, ServerError> {
    let store = Arc::new(DocumentStore::new());
    if let Some(path) = &config.document {
        store.load(path).await?;
    }
    let client = HttpClient::new(config.http)?;

    Ok(ToolServer::builder()
        .instructions(INSTRUCTIONS)
        .call_timeout(config.call_timeout)
        .shutdown_grace(config.shutdown_grace)
        .toolset(OpenApiTools::new(store))
        .toolset(HttpTools::new(client))
        .build())
}
