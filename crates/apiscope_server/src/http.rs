//! Outbound HTTP requests against the API a document describes.

use apiscope_tools::{CallContext, StructuredResult};
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Failures while sending an [`ApiRequest`].
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL could not be parsed.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The method is not a valid HTTP token.
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    /// A header name or value is not valid HTTP.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// The underlying client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent, even after retrying.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The response body is larger than the configured limit.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Maximum body size in bytes.
        limit: usize,
    },

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,

    /// The call's deadline passed before a response arrived.
    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

/// Defaults applied when a request leaves a setting out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDefaults {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Ceiling on the retries a request may ask for.
    pub max_retries_limit: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Largest response body that is read, in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 0,
            max_retries_limit: 10,
            retry_delay: Duration::from_millis(500),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A request to send, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// HTTP method, e.g. GET or POST (case-insensitive).
    pub method: String,
    /// Absolute URL; may already carry a query string.
    pub url: String,
    /// Request headers, e.g. Authorization or X-API-Key.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Cookies sent in a single Cookie header.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Query parameters; they replace parameters of the same name in the URL.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    /// Raw request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Content-Type of the body; overrides any Content-Type header.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt, on transport errors only. Capped by the server.
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl ApiRequest {
    /// Creates a request with no headers, body or overrides.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parses the URL and merges in the query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if the URL does not parse.
    pub fn target_url(&self) -> Result<Url, HttpError> {
        let mut url = Url::parse(&self.url).map_err(|err| HttpError::InvalidUrl {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;

        if !self.query_params.is_empty() {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| !self.query_params.contains_key(key.as_ref()))
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .extend_pairs(&self.query_params);
        }
        Ok(url)
    }

    fn http_method(&self) -> Result<Method, HttpError> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| HttpError::InvalidMethod(self.method.clone()))
    }

    fn header_map(&self) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }
        if let Some(content_type) = &self.content_type
            && !content_type.is_empty()
        {
            headers.insert(CONTENT_TYPE, header_value("Content-Type", content_type)?);
        }
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, header_value("Cookie", &cookie)?);
        }
        Ok(headers)
    }
}

fn header_name(name: &str) -> Result<HeaderName, HttpError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| HttpError::InvalidHeader(name.to_string()))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(name.to_string()))
}

/// What came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers; repeated headers are joined with `, `.
    pub headers: BTreeMap<String, String>,
    /// Response body, decoded as text.
    pub body: String,
}

impl StructuredResult for ApiResponse {}

/// Sends [`ApiRequest`]s with timeouts, bounded retry and cancellation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    defaults: HttpDefaults,
}

impl HttpClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Client`] if the TLS backend cannot be initialized.
    pub fn new(defaults: HttpDefaults) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("apiscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self { client, defaults })
    }

    /// Returns the defaults this client applies.
    #[must_use]
    pub fn defaults(&self) -> HttpDefaults {
        self.defaults
    }

    /// Sends `request`, observing `ctx`'s cancellation token and deadline.
    ///
    /// Transport failures (connection refused, timeouts) are retried up to
    /// `max_retries` times, never more than the configured `max_retries_limit`. Any HTTP status, including 4xx and 5xx, is a
    /// successful response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request is malformed, every attempt fails,
    /// the body cannot be read, or the call is cancelled or times out.
    pub async fn send(
        &self,
        ctx: &CallContext,
        request: &ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        let url = request.target_url()?;
        let method = request.http_method()?;
        let headers = request.header_map()?;
        let timeout = request
            .timeout_ms
            .map_or(self.defaults.timeout, Duration::from_millis);
        let max_retries = request
            .max_retries
            .unwrap_or(self.defaults.max_retries)
            .min(self.defaults.max_retries_limit);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let attempt_timeout = match ctx.remaining() {
                Some(remaining) if remaining.is_zero() => return Err(HttpError::DeadlineExceeded),
                Some(remaining) => timeout.min(remaining),
                None => timeout,
            };

            let mut builder = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .timeout(attempt_timeout);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            tracing::debug!(%method, %url, attempt, "sending request");
            let outcome = tokio::select! {
                () = ctx.cancelled() => return Err(HttpError::Cancelled),
                outcome = builder.send() => outcome,
            };

            match outcome {
                Ok(response) => {
                    return read_response(ctx, response, self.defaults.max_body_bytes).await;
                }
                Err(err) if attempt <= max_retries => {
                    tracing::warn!(%url, attempt, error = %err, "request failed, retrying");
                    tokio::select! {
                        () = ctx.cancelled() => return Err(HttpError::Cancelled),
                        () = tokio::time::sleep(self.defaults.retry_delay) => {}
                    }
                }
                Err(source) => {
                    if source.is_timeout() && ctx.remaining().is_some_and(|left| left.is_zero()) {
                        return Err(HttpError::DeadlineExceeded);
                    }
                    return Err(HttpError::Transport {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

async fn read_response(
    ctx: &CallContext,
    mut response: reqwest::Response,
    limit: usize,
) -> Result<ApiResponse, HttpError> {
    let status = response.status().as_u16();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str().to_string())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&value);
            })
            .or_insert_with(|| value.to_string());
    }

    if response
        .content_length()
        .is_some_and(|length| length > u64::try_from(limit).unwrap_or(u64::MAX))
    {
        return Err(HttpError::BodyTooLarge { limit });
    }

    let mut raw: Vec<u8> = Vec::new();
    loop {
        let chunk = tokio::select! {
            () = ctx.cancelled() => return Err(HttpError::Cancelled),
            chunk = response.chunk() => chunk.map_err(HttpError::Body)?,
        };
        let Some(chunk) = chunk else { break };
        if raw.len() + chunk.len() > limit {
            return Err(HttpError::BodyTooLarge { limit });
        }
        raw.extend_from_slice(&chunk);
    }
    let body = String::from_utf8_lossy(&raw).into_owned();

    tracing::debug!(status, bytes = body.len(), "received response");
    Ok(ApiResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_replace_same_named_url_params() {
        let mut request = ApiRequest::new("get", "http://localhost/pets?limit=5&sort=name");
        request.query_params.insert("limit".to_string(), "10".to_string());
        request.query_params.insert("page".to_string(), "2".to_string());

        let url = request.target_url().unwrap();
        assert_eq!(url.query(), Some("sort=name&limit=10&page=2"));
    }

    #[test]
    fn url_without_params_is_untouched() {
        let request = ApiRequest::new("get", "http://localhost/pets?limit=5");
        assert_eq!(
            request.target_url().unwrap().as_str(),
            "http://localhost/pets?limit=5"
        );
    }

    #[test]
    fn relative_urls_are_rejected() {
        let err = ApiRequest::new("get", "/pets").target_url().unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }), "got: {err}");
    }

    #[test]
    fn methods_are_upper_cased() {
        assert_eq!(ApiRequest::new("patch", "http://x").http_method().unwrap(), Method::PATCH);
        let err = ApiRequest::new("not a method", "http://x").http_method().unwrap_err();
        assert!(matches!(err, HttpError::InvalidMethod(_)));
    }

    #[test]
    fn content_type_and_cookies_become_headers() {
        let mut request = ApiRequest::new("post", "http://x");
        request
            .headers
            .insert("content-type".to_string(), "text/plain".to_string());
        request.content_type = Some("application/json".to_string());
        request.cookies.insert("a".to_string(), "1".to_string());
        request.cookies.insert("b".to_string(), "2".to_string());

        let headers = request.header_map().unwrap();
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[COOKIE], "a=1; b=2");
    }

    #[test]
    fn invalid_header_names_are_reported() {
        let mut request = ApiRequest::new("get", "http://x");
        request.headers.insert("bad header".to_string(), "v".to_string());
        let err = request.header_map().unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader(ref name) if name == "bad header"));
    }
}
