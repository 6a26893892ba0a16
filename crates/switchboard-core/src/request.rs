//! The per-request view handed to binders and passthrough handlers.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// Immutable view of one inbound HTTP request.
///
/// `RequestParts` carries everything the binding pipeline reads: the
/// method, the URI, the headers, and the fully buffered body. The
/// dispatcher builds one per request and hands it to the typed binder
/// (JSON-mode endpoints) or directly to the handler (passthrough
/// endpoints).
///
/// # Example
///
/// ```rust
/// use switchboard_core::RequestParts;
/// use http::Method;
///
/// let parts = RequestParts::builder()
///     .method(Method::POST)
///     .uri("/uploads")
///     .header("content-type", "application/json")
///     .body(r#"{"name": "report.pdf"}"#)
///     .build();
///
/// assert_eq!(parts.method(), &Method::POST);
/// assert_eq!(parts.content_type(), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestParts {
    /// Creates request parts from their components.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Returns a builder for assembling request parts.
    #[must_use]
    pub fn builder() -> RequestPartsBuilder {
        RequestPartsBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the buffered request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the parts and returns the body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Checks whether the request body is empty.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Builder for [`RequestParts`].
///
/// Used by embedders adapting their transport's request type, and
/// throughout the test suites.
#[derive(Debug, Default)]
pub struct RequestPartsBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestPartsBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI from anything convertible into one.
    ///
    /// Invalid URIs are ignored and surface as a panic in [`build`].
    ///
    /// [`build`]: Self::build
    #[must_use]
    pub fn uri<U>(mut self, uri: U) -> Self
    where
        U: TryInto<Uri>,
    {
        if let Ok(uri) = uri.try_into() {
            self.uri = Some(uri);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a single header. Unparsable values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the request parts.
    ///
    /// # Panics
    ///
    /// Panics if the method or URI was not set.
    #[must_use]
    pub fn build(self) -> RequestParts {
        RequestParts {
            method: self.method.expect("method is required"),
            uri: self.uri.expect("uri is required"),
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parts_accessors() {
        let parts = RequestParts::builder()
            .method(Method::GET)
            .uri("/users?active=true")
            .header("x-request-id", "abc-123")
            .build();

        assert_eq!(parts.method(), &Method::GET);
        assert_eq!(parts.path(), "/users");
        assert_eq!(parts.query_string(), Some("active=true"));
        assert_eq!(parts.header("x-request-id"), Some("abc-123"));
        assert_eq!(parts.header("missing"), None);
        assert!(parts.is_body_empty());
    }

    #[test]
    fn test_request_parts_body() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/")
            .body("hello world")
            .build();

        assert!(!parts.is_body_empty());
        assert_eq!(parts.body(), &Bytes::from_static(b"hello world"));
        assert_eq!(parts.into_body(), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_content_type() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json; charset=utf-8")
            .build();

        assert_eq!(
            parts.content_type(),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn test_builder_replaces_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", "application/json".parse().unwrap());

        let parts = RequestParts::builder()
            .method(Method::GET)
            .uri("/")
            .headers(headers)
            .build();

        assert_eq!(parts.header("accept"), Some("application/json"));
    }

    #[test]
    #[should_panic(expected = "method is required")]
    fn test_builder_requires_method() {
        let _ = RequestParts::builder().uri("/").build();
    }
}
