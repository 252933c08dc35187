//! OpenAPI v3 documents for apiscope tools.
//!
//! - [`OpenApiDocument`]: the parsed document, with
//!   [`list_entries`](OpenApiDocument::list_entries) and
//!   [`get_entry`](OpenApiDocument::get_entry)
//! - [`DocumentStore`]: the process-wide slot holding the loaded document
//! - [`DocumentError`]: every way loading or lookup can fail

pub mod document;
pub mod error;
pub mod method;
pub mod store;

pub use document::{ApiSummary, Info, MethodSummary, OpenApiDocument, Operation, PathItem, Server};
pub use error::DocumentError;
pub use method::HttpMethod;
pub use store::{DocumentStore, LoadedDocument};
