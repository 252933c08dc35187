//! Error type for document loading and lookup.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or querying an OpenAPI document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document file could not be read.
    #[error("failed to read OpenAPI document from {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document text is not valid YAML or JSON, or does not fit the model.
    #[error("failed to parse OpenAPI document from {origin}: {source}")]
    Parse {
        /// Where the text came from (a path, or `input`).
        origin: String,
        /// Underlying parser error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The document is not an OpenAPI 3.x document.
    #[error("unsupported OpenAPI version {found}: only 3.x documents are supported")]
    UnsupportedVersion {
        /// The version that was declared, or `none`.
        found: String,
    },

    /// The requested HTTP method is outside the set OpenAPI allows.
    #[error("Method {0} is not allowed")]
    MethodNotAllowed(String),

    /// No path item has this exact path.
    #[error("Url path {0:?} was not found in OpenAPI document")]
    PathNotFound(String),

    /// The path exists but declares no operation for this method.
    #[error("Method {method:?} not found in Url path {path:?}")]
    OperationNotFound {
        /// Path that was found.
        path: String,
        /// Lower-cased method that was looked up.
        method: String,
    },

    /// No document has been loaded yet.
    #[error("no OpenAPI document has been loaded")]
    NotLoaded,
}
