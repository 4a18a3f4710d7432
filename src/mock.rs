use crate::{Error, ErrorKind};
use bytes::Bytes;
use http::{Method, StatusCode};
use std::collections::HashMap;
use std::io;

///
/// The synthetic resource attached to an internal request.
///
/// Its type and super type are set explicitly by the builder rather than
/// discovered from stored content, which lets the resolution machinery pick
/// a handler without any repository access.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockResource {
    pub(crate) path: String,
    pub(crate) resource_type: Option<String>,
    pub(crate) resource_super_type: Option<String>,
}

impl MockResource {
    /// The path this resource was synthesized for.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The resource type used to resolve a handler, if set.
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// The resource super type used as a resolution fallback, if set.
    pub fn resource_super_type(&self) -> Option<&str> {
        self.resource_super_type.as_deref()
    }

    ///
    /// Returns `true` if this resource's type or super type equals the
    /// supplied value. Convenient when implementing a `ServletResolver`
    /// that picks handlers by resource type.
    ///
    pub fn is_resource_type(&self, resource_type: &str) -> bool {
        self.resource_type.as_deref() == Some(resource_type)
            || self.resource_super_type.as_deref() == Some(resource_type)
    }
}

///
/// The in-memory request handed to the delegated back end.
///
/// Carries the configuration snapshot taken by `InternalRequest::execute`:
/// method, resolution metadata, headers, parameters and the buffered body.
/// All accessors are read-only; the pair is immutable once dispatched.
///
#[derive(Clone, Debug)]
pub struct MockRequest {
    pub(crate) method: Method,
    pub(crate) resource: MockResource,
    pub(crate) selector_string: Option<String>,
    pub(crate) extension: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) parameters: HashMap<String, String>,
    pub(crate) body: Bytes,
}

impl MockRequest {
    /// The HTTP method of this request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The resource path this request targets.
    pub fn path(&self) -> &str {
        self.resource.path()
    }

    /// The synthetic resource used for handler resolution.
    pub fn resource(&self) -> &MockResource {
        &self.resource
    }

    /// The selectors joined with `.`, if any were set.
    pub fn selector_string(&self) -> Option<&str> {
        self.selector_string.as_deref()
    }

    /// The individual selectors, in the order they were set.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selector_string
            .as_deref()
            .into_iter()
            .flat_map(|joined| joined.split('.'))
    }

    /// The request extension, if set.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// The request content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Looks up a request header. The field letter case is ignored.
    pub fn header(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.as_str())
    }

    /// All request headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a single request parameter.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// The full parameter map.
    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    ///
    /// The parameter map rendered as a URL-encoded query string, with keys
    /// in lexicographic order so the result is stable for assertions.
    ///
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = self
            .parameters
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        pairs.sort_unstable();
        serde_urlencoded::to_string(pairs).unwrap()
    }

    /// The buffered request body. Empty when no body was configured.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

///
/// The in-memory response populated by the delegated back end.
///
/// Starts out as 200 OK with no content type and an empty output buffer.
/// Handlers mutate it through the setters and the `writer` sink; after the
/// dispatch the builder only hands out shared references.
///
#[derive(Clone, Debug)]
pub struct MockResponse {
    status: StatusCode,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    output: Vec<u8>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            headers: Vec::new(),
            output: Vec::new(),
        }
    }
}

impl MockResponse {
    /// The response status. Defaults to 200 OK.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    ///
    /// Sets the response status.
    ///
    /// # Panics
    ///
    /// Panics if the code is outside the 100-999 range.
    ///
    #[track_caller]
    pub fn set_status(&mut self, status: u16) {
        self.status = StatusCode::from_u16(status)
            .map_err(|_| Error::new_with_context(ErrorKind::InvalidStatusCode, status))
            .unwrap();
    }

    /// The response content type, if one was set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Sets the response content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Looks up a response header. The field letter case is ignored.
    pub fn header(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.as_str())
    }

    /// All response headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Adds a response header.
    pub fn add_header(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.headers.push((field.into(), value.into()));
    }

    ///
    /// An `io::Write` sink appending to the response output buffer.
    ///
    /// ## Example
    ///
    /// ```
    /// use std::io::Write;
    ///
    /// let mut response = inquest::MockResponse::default();
    /// response.set_content_type("text/plain");
    /// write!(response.writer(), "hello").unwrap();
    /// assert_eq!(response.output(), b"hello");
    /// ```
    ///
    pub fn writer(&mut self) -> impl io::Write + '_ {
        &mut self.output
    }

    /// The raw bytes written to the response so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    ///
    /// The response output decoded as UTF-8.
    ///
    /// Returns a `ResponseBodyFailure` error when the output is not valid
    /// UTF-8.
    ///
    pub fn output_as_string(&self) -> Result<String, Error> {
        String::from_utf8(self.output.clone())
            .map_err(|err| Error::new_with_source(ErrorKind::ResponseBodyFailure, err.into()))
    }
}
