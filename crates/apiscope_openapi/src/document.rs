//! OpenAPI v3 document model.
//!
//! Only the parts of a document the inspection tools consult are typed:
//! `info`, `servers`, ordered `paths` and the operations under them. Everything
//! else is kept verbatim in `extra` maps, so an operation serializes back with
//! its parameters, request body, responses and any `x-` extensions intact.
//! References (`$ref`) are left unresolved.

use crate::error::DocumentError;
use crate::method::HttpMethod;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A parsed OpenAPI 3.x document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// Declared version, always `3.x`.
    pub openapi: String,
    /// Document metadata.
    pub info: Info,
    /// Servers the API is reachable at.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Path items in document order.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Remaining top-level fields (`components`, `tags`, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The `info` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// API version (not the OpenAPI version).
    #[serde(default)]
    pub version: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry of `servers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Base URL.
    pub url: String,
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations available on a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `GET` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// `PUT` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// `POST` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// `DELETE` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// `OPTIONS` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// `HEAD` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// `PATCH` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// `TRACE` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Parameters shared by every operation on this path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    /// Remaining fields (`servers`, `$ref`, extensions).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PathItem {
    /// Returns the operation declared for `method`.
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Iterates the declared operations in [`HttpMethod::ALL`] order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| self.operation(method).map(|op| (method, op)))
    }
}

/// A single API operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Grouping tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Operation parameters, unresolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    /// Request body, unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Responses keyed by status code (or `default`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Value>,
    /// Whether the operation is deprecated.
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub deprecated: bool,
    /// Remaining fields (`security`, `callbacks`, extensions).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Overview of one path, as returned by [`OpenApiDocument::list_entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSummary {
    /// Path item description; empty when absent.
    pub description: String,
    /// Path item summary; empty when absent.
    pub summary: String,
    /// The path template, e.g. `/pets/{id}`.
    pub url: String,
    /// Declared operations.
    pub methods: Vec<MethodSummary>,
}

/// Overview of one operation within an [`ApiSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSummary {
    /// Lower-case method label.
    pub method: String,
    /// Operation description; empty when absent.
    pub description: String,
    /// Operation summary; empty when absent.
    pub summary: String,
}

#[derive(Deserialize)]
struct VersionProbe {
    openapi: Option<String>,
    swagger: Option<String>,
}

impl OpenApiDocument {
    /// Parses a YAML or JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Parse`] for malformed text and
    /// [`DocumentError::UnsupportedVersion`] for anything but OpenAPI 3.x.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Self::parse_from(text, "input")
    }

    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Read`] if the file cannot be read, otherwise
    /// see [`parse`](Self::parse).
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse_from(&text, &path.display().to_string())
    }

    fn parse_from(text: &str, origin: &str) -> Result<Self, DocumentError> {
        let parse_error = |source| DocumentError::Parse {
            origin: origin.to_string(),
            source,
        };

        let probe: VersionProbe = serde_yaml::from_str(text).map_err(parse_error)?;
        match (probe.openapi, probe.swagger) {
            (Some(version), _) if version.starts_with("3.") => {}
            (Some(found), _) | (None, Some(found)) => {
                return Err(DocumentError::UnsupportedVersion { found });
            }
            (None, None) => {
                return Err(DocumentError::UnsupportedVersion {
                    found: "none".to_string(),
                });
            }
        }

        serde_yaml::from_str(text).map_err(parse_error)
    }

    /// Lists every path and its operations, in document order.
    #[must_use]
    pub fn list_entries(&self) -> Vec<ApiSummary> {
        self.paths
            .iter()
            .map(|(url, item)| ApiSummary {
                description: item.description.clone().unwrap_or_default(),
                summary: item.summary.clone().unwrap_or_default(),
                url: url.clone(),
                methods: item
                    .operations()
                    .map(|(method, op)| MethodSummary {
                        method: method.as_str().to_string(),
                        description: op.description.clone().unwrap_or_default(),
                        summary: op.summary.clone().unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Looks up the operation for `method` on the exact path `path`.
    ///
    /// The method is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::MethodNotAllowed`] if `method` is not an HTTP method
    ///   OpenAPI can describe (checked before the path)
    /// - [`DocumentError::PathNotFound`] if no path item matches
    /// - [`DocumentError::OperationNotFound`] if the path has no such operation
    pub fn get_entry(&self, path: &str, method: &str) -> Result<&Operation, DocumentError> {
        let method: HttpMethod = method.parse()?;
        let item = self
            .paths
            .get(path)
            .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;
        item.operation(method)
            .ok_or_else(|| DocumentError::OperationNotFound {
                path: path.to_string(),
                method: method.as_str().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    summary: Pets collection
    post:
      summary: Create a pet
      x-rate-limit: 10
    get:
      summary: List pets
      description: Returns every pet.
      responses:
        '200':
          description: OK
  /pets/{id}:
    delete:
      operationId: deletePet
components:
  schemas: {}
"#;

    #[test]
    fn unquoted_version_is_accepted() {
        let doc = OpenApiDocument::parse(PETSTORE).unwrap();
        assert_eq!(doc.openapi, "3.0.3");
        assert_eq!(doc.info.title, "Petstore");
        assert!(doc.extra.contains_key("components"));
    }

    #[test]
    fn operations_follow_method_order() {
        let doc = OpenApiDocument::parse(PETSTORE).unwrap();
        let methods: Vec<_> = doc.paths["/pets"].operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn extensions_survive_round_trip() {
        let doc = OpenApiDocument::parse(PETSTORE).unwrap();
        let post = doc.get_entry("/pets", "post").unwrap();
        let value = serde_json::to_value(post).unwrap();
        assert_eq!(value["x-rate-limit"], 10);
        assert_eq!(value["summary"], "Create a pet");
        assert!(value.get("deprecated").is_none());
    }

    #[test]
    fn swagger_documents_are_rejected() {
        let err = OpenApiDocument::parse("swagger: '2.0'\ninfo: {title: t, version: v}\n")
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { ref found } if found == "2.0"));
    }

    #[test]
    fn missing_version_is_rejected() {
        let err = OpenApiDocument::parse("info: {title: t, version: v}\n").unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { ref found } if found == "none"));
    }
}
