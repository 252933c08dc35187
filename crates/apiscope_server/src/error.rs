//! Error type for assembling and running the server.

use apiscope_openapi::DocumentError;
use thiserror::Error;

use crate::http::HttpError;

/// Failures that stop the server, as opposed to failures of a single call.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading from or writing to the transport failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// A transport task panicked or was aborted.
    #[error("transport task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The document configured for preloading could not be loaded.
    #[error("failed to preload OpenAPI document: {0}")]
    Preload(#[from] DocumentError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Http(#[from] HttpError),
}
