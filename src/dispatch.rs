use crate::{MockRequest, MockResponse};

///
/// The failure type crossing the collaborator seams.
///
/// Anything the delegated back end raises is carried as a boxed error and
/// wrapped by `InternalRequest::execute` into an `ErrorKind::Dispatch`
/// failure, with the original as its source.
///
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;

///
/// The access-control context an internal request runs under.
///
/// The helper never resolves anything through it; it is built once by the
/// caller and forwarded untouched to the delegated back end, which uses it
/// to authorize the dispatch.
///
pub trait ResourceResolver {
    /// Identifier of the principal this resolver was opened for, when known.
    fn user_id(&self) -> Option<&str> {
        None
    }
}

///
/// The full request-processing pipeline: filters, resolution and handler
/// invocation, equivalent to how a real inbound request is handled.
///
/// Implemented for closures of the matching shape, so a test can register
/// a plain `fn` as its pipeline.
///
pub trait RequestProcessor {
    /// Processes `request` and populates `response`.
    fn process_request(
        &self,
        request: &MockRequest,
        response: &mut MockResponse,
        resolver: &dyn ResourceResolver,
    ) -> Result<(), DispatchError>;
}

impl<F> RequestProcessor for F
where
    F: Fn(&MockRequest, &mut MockResponse, &dyn ResourceResolver) -> Result<(), DispatchError>,
{
    fn process_request(
        &self,
        request: &MockRequest,
        response: &mut MockResponse,
        resolver: &dyn ResourceResolver,
    ) -> Result<(), DispatchError> {
        self(request, response, resolver)
    }
}

///
/// A resolved handler: a servlet or script invoked with the synthetic
/// request/response pair.
///
/// Implemented for closures of the matching shape.
///
pub trait Servlet {
    /// Handles `request` and populates `response`.
    fn service(
        &self,
        request: &MockRequest,
        response: &mut MockResponse,
    ) -> Result<(), DispatchError>;
}

impl<F> Servlet for F
where
    F: Fn(&MockRequest, &mut MockResponse) -> Result<(), DispatchError>,
{
    fn service(
        &self,
        request: &MockRequest,
        response: &mut MockResponse,
    ) -> Result<(), DispatchError> {
        self(request, response)
    }
}

///
/// Resolves the servlet or script that handles a request, based on the
/// synthesized resource type, selectors, extension and method.
///
pub trait ServletResolver {
    /// Returns the handler for `request`, or `None` when nothing matches.
    fn resolve_servlet(&self, request: &MockRequest) -> Option<&dyn Servlet>;
}

/// The two interchangeable execution back ends, selected at builder
/// construction. Stateless aside from the collaborator they borrow.
pub(crate) enum Strategy<'a> {
    Pipeline(&'a dyn RequestProcessor),
    Direct(&'a dyn ServletResolver),
}

impl Strategy<'_> {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Strategy::Pipeline(_) => "pipeline",
            Strategy::Direct(_) => "direct",
        }
    }

    pub(crate) fn delegate_execute(
        &self,
        request: &MockRequest,
        response: &mut MockResponse,
        resolver: &dyn ResourceResolver,
    ) -> Result<(), DispatchError> {
        match self {
            Strategy::Pipeline(processor) => {
                log::debug!("executing request through the full processing pipeline");
                processor.process_request(request, response, resolver)
            }
            Strategy::Direct(servlets) => {
                log::debug!("executing request directly against the resolved servlet");
                let servlet = servlets
                    .resolve_servlet(request)
                    .ok_or_else(|| format!("no servlet or script found for {}", request.path()))?;
                servlet.service(request, response)
            }
        }
    }
}
