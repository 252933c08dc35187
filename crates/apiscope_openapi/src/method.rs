//! HTTP methods an OpenAPI path item can declare operations for.

use crate::error::DocumentError;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// One of the eight operation slots of an OpenAPI path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// All methods, in the order path items list their operations.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Lower-case label, as used for path item keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Lower-case labels of all methods.
    #[must_use]
    pub fn labels() -> [&'static str; 8] {
        Self::ALL.map(Self::as_str)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DocumentError;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentError::MethodNotAllowed(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_ignores_case() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!("trace".parse::<HttpMethod>().unwrap(), HttpMethod::Trace);
    }

    #[test]
    fn unknown_methods_are_not_allowed() {
        let err = "connect".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, DocumentError::MethodNotAllowed(ref m) if m == "connect"));
        assert_eq!(err.to_string(), "Method connect is not allowed");
    }

    #[test]
    fn labels_follow_path_item_order() {
        assert_eq!(
            HttpMethod::labels(),
            ["get", "put", "post", "delete", "options", "head", "patch", "trace"]
        );
    }
}
