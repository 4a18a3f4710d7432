use crate::context;
use crate::dispatch::{RequestProcessor, ResourceResolver, ServletResolver, Strategy};
use crate::mock::{MockRequest, MockResource, MockResponse};
use crate::{Error, ErrorKind};
use bytes::Bytes;
use http::{Method, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

/// The request method used when `with_method` is never called.
pub const DEFAULT_METHOD: Method = Method::GET;

enum BodySource<'a> {
    Bytes(Bytes),
    Reader(Box<dyn Read + 'a>),
}

impl fmt::Debug for BodySource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BodySource::Bytes(ref bytes) => bytes.fmt(f),
            BodySource::Reader(_) => f.write_str("<reader>"),
        }
    }
}

#[derive(Debug)]
struct Executed {
    request: MockRequest,
    response: MockResponse,
}

///
/// Fluent helper for internal requests: requests synthesized in-process,
/// without a network connection, to exercise the same resolution and
/// dispatch machinery that serves real HTTP traffic.
///
/// Two modes are supported: the full request-processing pipeline, driven by
/// a [`RequestProcessor`], and a direct call to the servlet resolved by a
/// [`ServletResolver`], which is faster but skips the filter chain. Both
/// modes use the standard resolution metadata (resource type and super
/// type, method, selectors, extension), so that resolution mechanism can be
/// exercised for other purposes than serving inbound traffic.
///
/// Configuration is accumulated through the chained `with_*` setters and
/// turned into an immutable [`MockRequest`]/[`MockResponse`] pair by
/// [`execute`](InternalRequest::execute), which may be called at most once.
/// After execution the response is reached through the accessors; unless
/// [`check_status`](InternalRequest::check_status) was called explicitly,
/// the first access verifies a 200 OK status so a failed dispatch cannot go
/// unnoticed.
///
/// ## Example
///
/// ```
/// use inquest::{DispatchError, InternalRequest, MockRequest, MockResponse, ResourceResolver};
/// use std::io::Write;
///
/// struct Anonymous;
/// impl ResourceResolver for Anonymous {}
///
/// fn pipeline(
///     request: &MockRequest,
///     response: &mut MockResponse,
///     _resolver: &dyn ResourceResolver,
/// ) -> Result<(), DispatchError> {
///     response.set_content_type("text/plain");
///     write!(response.writer(), "served {}", request.path())?;
///     Ok(())
/// }
///
/// # fn main() -> Result<(), inquest::Error> {
/// let resolver = Anonymous;
/// let mut request = InternalRequest::pipeline(&resolver, &pipeline, "/content/status");
/// request.with_selectors(["print", "a4"]).with_extension("txt");
/// request.execute()?.check_response_content_type("text/plain")?;
/// assert_eq!(request.response_as_string()?, "served /content/status");
/// # Ok(())
/// # }
/// ```
///
pub struct InternalRequest<'a> {
    resolver: &'a dyn ResourceResolver,
    strategy: Strategy<'a>,
    path: String,
    method: Method,
    selector_string: Option<String>,
    extension: Option<String>,
    resource_type: Option<String>,
    resource_super_type: Option<String>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    parameters: HashMap<String, String>,
    body: Option<BodySource<'a>>,
    explicit_status_check: bool,
    exec: Option<Executed>,
}

impl<'a> InternalRequest<'a> {
    fn new(
        resolver: &'a dyn ResourceResolver,
        strategy: Strategy<'a>,
        path: impl Into<String>,
    ) -> InternalRequest<'a> {
        InternalRequest {
            resolver,
            strategy,
            path: path.into(),
            method: DEFAULT_METHOD,
            selector_string: None,
            extension: None,
            resource_type: None,
            resource_super_type: None,
            content_type: None,
            headers: Vec::new(),
            parameters: HashMap::new(),
            body: None,
            explicit_status_check: false,
            exec: None,
        }
    }

    ///
    /// Starts preparing an internal request that runs through the full
    /// request-processing pipeline, filters included — equivalent to how a
    /// real inbound request is handled.
    ///
    /// `resolver` is the access-control context the dispatch runs under,
    /// `processor` the pipeline to delegate to and `path` the path of the
    /// request.
    ///
    pub fn pipeline(
        resolver: &'a dyn ResourceResolver,
        processor: &'a dyn RequestProcessor,
        path: impl Into<String>,
    ) -> InternalRequest<'a> {
        Self::new(resolver, Strategy::Pipeline(processor), path)
    }

    ///
    /// Starts preparing an internal request that calls the resolved servlet
    /// directly. This bypasses the filters of the full processing pipeline,
    /// which are often not needed for internal requests, and is faster but
    /// less faithful to the way real traffic is processed.
    ///
    /// `resolver` is the access-control context the dispatch runs under,
    /// `servlets` resolves the servlet or script handling the request and
    /// `path` is the path of the request.
    ///
    pub fn direct(
        resolver: &'a dyn ResourceResolver,
        servlets: &'a dyn ServletResolver,
        path: impl Into<String>,
    ) -> InternalRequest<'a> {
        Self::new(resolver, Strategy::Direct(servlets), path)
    }

    /// The path this request targets.
    pub fn path(&self) -> &str {
        &self.path
    }

    ///
    /// Sets the HTTP request method to use — defaults to GET. The value is
    /// uppercased before use.
    ///
    /// # Panics
    ///
    /// Panics if the value is not a valid method token.
    ///
    #[track_caller]
    pub fn with_method(&mut self, method: &str) -> &mut Self {
        let method = method.to_uppercase();
        self.method = Method::from_bytes(method.as_bytes())
            .unwrap_or_else(|_| panic!("invalid request method: {method}"));
        self
    }

    /// Sets the content type of the request.
    pub fn with_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Uses the supplied bytes as the request's body content.
    pub fn with_body(&mut self, body: impl AsRef<[u8]>) -> &mut Self {
        self.body = Some(BodySource::Bytes(Bytes::copy_from_slice(body.as_ref())));
        self
    }

    ///
    /// Uses the supplied reader as the request's body content. The reader
    /// is drained once, when the request is executed.
    ///
    pub fn with_body_from_reader(&mut self, body: impl Read + 'a) -> &mut Self {
        self.body = Some(BodySource::Reader(Box::new(body)));
        self
    }

    /// Sets the resource type of the synthetic resource used to resolve the
    /// servlet or script handling the request.
    pub fn with_resource_type(&mut self, resource_type: impl Into<String>) -> &mut Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Sets the resource super type of the synthetic resource used to
    /// resolve the servlet or script handling the request.
    pub fn with_resource_super_type(
        &mut self,
        resource_super_type: impl Into<String>,
    ) -> &mut Self {
        self.resource_super_type = Some(resource_super_type.into());
        self
    }

    ///
    /// Sets the optional selectors of the request, which influence servlet
    /// resolution. The values are joined with `.` into the selector string;
    /// an empty list leaves the selectors unset.
    ///
    pub fn with_selectors<I, S>(&mut self, selectors: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = selectors
            .into_iter()
            .map(|selector| selector.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        self.selector_string = if joined.is_empty() { None } else { Some(joined) };
        self
    }

    /// Sets the optional extension of the request, which influences servlet
    /// resolution.
    pub fn with_extension(&mut self, extension: impl Into<String>) -> &mut Self {
        self.extension = Some(extension.into());
        self
    }

    /// Adds a request header.
    pub fn with_header(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((field.into(), value.into()));
        self
    }

    ///
    /// Sets a request parameter.
    ///
    /// # Panics
    ///
    /// Panics if the key or the value is empty.
    ///
    #[track_caller]
    pub fn with_parameter(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let key = key.into();
        let value = value.into();
        assert!(!key.is_empty(), "parameter key must not be empty");
        assert!(!value.is_empty(), "parameter value must not be empty");
        self.parameters.insert(key, value);
        self
    }

    /// Adds the supplied request parameters to the current ones.
    pub fn with_parameters<I, K, V>(&mut self, additional_parameters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.extend(
            additional_parameters
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    /// Essential request info, also used as the correlation tag while the
    /// request is dispatched.
    fn request_info(&self) -> String {
        format!(
            "{} P={} S={} EXT={} RT={}({})",
            self.method,
            self.path,
            self.selector_string.as_deref().unwrap_or("-"),
            self.extension.as_deref().unwrap_or("-"),
            self.resource_type.as_deref().unwrap_or("-"),
            self.resource_super_type.as_deref().unwrap_or("-"),
        )
    }

    ///
    /// Executes the internal request. Can be called right after creating
    /// it, if no options need to be set.
    ///
    /// The accumulated configuration is snapshot into a request/response
    /// pair, the correlation tag (see
    /// [`current_request_info`](crate::current_request_info)) is installed
    /// for the duration of the call and the dispatch is delegated to the
    /// back end selected at construction. Any failure raised by the back
    /// end is wrapped into an [`ErrorKind::Dispatch`] error; the response
    /// produced up to that point stays accessible.
    ///
    /// Fails with [`ErrorKind::AlreadyExecuted`] when called a second time.
    ///
    pub fn execute(&mut self) -> Result<&mut Self, Error> {
        if self.exec.is_some() {
            return Err(Error::new(ErrorKind::AlreadyExecuted));
        }

        let body = match self.body.take() {
            Some(BodySource::Bytes(bytes)) => bytes,
            Some(BodySource::Reader(mut reader)) => {
                let mut buffer = Vec::new();
                reader
                    .read_to_end(&mut buffer)
                    .map_err(|err| Error::new_with_source(ErrorKind::RequestBodyFailure, err.into()))?;
                Bytes::from(buffer)
            }
            None => Bytes::new(),
        };

        let request = MockRequest {
            method: self.method.clone(),
            resource: MockResource {
                path: self.path.clone(),
                resource_type: self.resource_type.clone(),
                resource_super_type: self.resource_super_type.clone(),
            },
            selector_string: self.selector_string.clone(),
            extension: self.extension.clone(),
            content_type: self.content_type.clone(),
            headers: self.headers.clone(),
            parameters: self.parameters.clone(),
            body,
        };
        let mut response = MockResponse::default();

        let result = {
            let _request_info = context::enter(self.request_info());
            self.strategy
                .delegate_execute(&request, &mut response, self.resolver)
        };

        // Keep the pair around even when the dispatch failed, so callers
        // can still look at whatever status and content were produced.
        self.exec = Some(Executed { request, response });
        result.map_err(|err| Error::new_with_source(ErrorKind::Dispatch, err))?;
        Ok(self)
    }

    fn executed(&self) -> Result<&Executed, Error> {
        self.exec
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::NotYetExecuted))
    }

    ///
    /// After executing the request, checks that the response status is one
    /// of the supplied values; providing no values means "don't care".
    ///
    /// If this is not called before the methods that access the response, a
    /// check for a 200 OK status is done automatically, to make sure
    /// callers don't forget to check it.
    ///
    pub fn check_status(&mut self, acceptable_values: &[u16]) -> Result<&mut Self, Error> {
        let actual = self.executed()?.response.status().as_u16();
        self.explicit_status_check = true;

        if acceptable_values.is_empty() || acceptable_values.contains(&actual) {
            Ok(self)
        } else {
            Err(unexpected_status(actual, acceptable_values))
        }
    }

    /// If the response status hasn't been explicitly checked, ensure it's
    /// 200.
    fn maybe_check_ok_status(&self) -> Result<(), Error> {
        if self.explicit_status_check {
            return Ok(());
        }
        let actual = self.executed()?.response.status();
        if actual == StatusCode::OK {
            Ok(())
        } else {
            Err(unexpected_status(actual.as_u16(), &[StatusCode::OK.as_u16()]))
        }
    }

    /// After executing the request, checks that the response content type
    /// is exactly the expected one.
    pub fn check_response_content_type(&mut self, content_type: &str) -> Result<&mut Self, Error> {
        let actual = self.executed()?.response.content_type();
        if actual == Some(content_type) {
            Ok(self)
        } else {
            Err(Error::new_with_context(
                ErrorKind::ContentTypeMismatch,
                format!(
                    "expected {} but got {}",
                    content_type,
                    actual.unwrap_or("none")
                ),
            ))
        }
    }

    /// The response status. The request must have been executed.
    pub fn status(&self) -> Result<StatusCode, Error> {
        Ok(self.executed()?.response.status())
    }

    ///
    /// The response object. The request must have been executed; unless the
    /// status was explicitly checked, a 200 OK status is verified first.
    ///
    pub fn response(&self) -> Result<&MockResponse, Error> {
        let exec = self.executed()?;
        self.maybe_check_ok_status()?;
        Ok(&exec.response)
    }

    /// The response output as a string, with the same execution and status
    /// requirements as [`response`](InternalRequest::response).
    pub fn response_as_string(&self) -> Result<String, Error> {
        self.response()?.output_as_string()
    }
}

fn unexpected_status(actual: u16, expected: &[u16]) -> Error {
    let expected = expected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Error::new_with_context(
        ErrorKind::UnexpectedStatus,
        format!("got {actual}, expected one of {expected}"),
    )
}

impl fmt::Debug for InternalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalRequest")
            .field("strategy", &self.strategy.label())
            .field("info", &self.request_info())
            .field("executed", &self.exec.is_some())
            .finish()
    }
}

impl fmt::Display for InternalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} internal request {}",
            self.strategy.label(),
            self.request_info()
        )
    }
}

impl Drop for InternalRequest<'_> {
    fn drop(&mut self) {
        if self.exec.is_none() {
            log::warn!("Missing .execute() call on {}", self);
        }
    }
}
