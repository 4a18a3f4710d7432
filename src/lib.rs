#![warn(missing_docs)]

//!
//! Inquest is a small fluent helper for issuing *internal requests* in test
//! and tooling code: requests that never arrive over a network socket but
//! are synthesized in-process to invoke the same resource-resolution and
//! servlet-dispatch machinery that handles real HTTP traffic.
//!
//! The helper builds a synthetic [`MockRequest`]/[`MockResponse`] pair,
//! attaches the resolution metadata (resource type and super type, HTTP
//! method, selectors, extension) and delegates execution to one of two back
//! ends:
//!
//! - [`InternalRequest::pipeline`] runs the request through a caller-supplied
//!   [`RequestProcessor`] — the full processing chain, filters included,
//!   equivalent to how a real inbound request is handled;
//! - [`InternalRequest::direct`] resolves the target handler through a
//!   caller-supplied [`ServletResolver`] and invokes it directly, skipping
//!   filters — faster, less faithful to real traffic.
//!
//! Resolution, dispatch and access control themselves live behind those
//! traits; this crate only configures and triggers them.
//!
//! # Getting started
//!
//! ```
//! use inquest::{
//!     DispatchError, InternalRequest, MockRequest, MockResponse, ResourceResolver, Servlet,
//!     ServletResolver,
//! };
//! use std::io::Write;
//!
//! struct Admin;
//! impl ResourceResolver for Admin {
//!     fn user_id(&self) -> Option<&str> {
//!         Some("admin")
//!     }
//! }
//!
//! struct HelloServlet;
//! impl Servlet for HelloServlet {
//!     fn service(
//!         &self,
//!         request: &MockRequest,
//!         response: &mut MockResponse,
//!     ) -> Result<(), DispatchError> {
//!         response.set_content_type("text/plain");
//!         let name = request.parameter("name").unwrap_or("world");
//!         write!(response.writer(), "hello {}", name)?;
//!         Ok(())
//!     }
//! }
//!
//! struct ByResourceType(HelloServlet);
//! impl ServletResolver for ByResourceType {
//!     fn resolve_servlet(&self, request: &MockRequest) -> Option<&dyn Servlet> {
//!         request
//!             .resource()
//!             .is_resource_type("demo/hello")
//!             .then_some(&self.0 as &dyn Servlet)
//!     }
//! }
//!
//! # fn main() -> Result<(), inquest::Error> {
//! let resolver = Admin;
//! let servlets = ByResourceType(HelloServlet);
//!
//! let mut request = InternalRequest::direct(&resolver, &servlets, "/content/greeting");
//! request
//!     .with_resource_type("demo/hello")
//!     .with_extension("txt")
//!     .with_parameter("name", "you");
//! request.execute()?.check_status(&[200])?;
//! assert_eq!(request.response_as_string()?, "hello you");
//! # Ok(())
//! # }
//! ```
//!
//! # Checking the response
//!
//! A builder executes at most once; a second [`execute`] call fails with
//! [`ErrorKind::AlreadyExecuted`], and every accessor fails with
//! [`ErrorKind::NotYetExecuted`] until the request ran.
//!
//! [`check_status`] accepts any of the supplied values and fails with the
//! actual and expected values in the message otherwise. If the response is
//! accessed without an explicit `check_status` call, a 200 OK check runs
//! automatically — a dispatch that produced a 404 cannot slip through an
//! assertion on the body:
//!
//! ```
//! # use inquest::{DispatchError, InternalRequest, MockRequest, MockResponse, ResourceResolver};
//! # struct Anonymous;
//! # impl ResourceResolver for Anonymous {}
//! # fn not_found(
//! #     _request: &MockRequest,
//! #     response: &mut MockResponse,
//! #     _resolver: &dyn ResourceResolver,
//! # ) -> Result<(), DispatchError> {
//! #     response.set_status(404);
//! #     Ok(())
//! # }
//! # fn main() -> Result<(), inquest::Error> {
//! let resolver = Anonymous;
//! let mut request = InternalRequest::pipeline(&resolver, &not_found, "/content/missing");
//! request.execute()?;
//!
//! // The implicit 200 check rejects the 404 response...
//! assert!(request.response_as_string().is_err());
//!
//! // ...while an explicit check accepts it.
//! request.check_status(&[200, 404])?;
//! assert_eq!(request.status()?.as_u16(), 404);
//! # Ok(())
//! # }
//! ```
//!
//! # Correlation tag
//!
//! While a request is being dispatched, a correlation tag with the
//! essential request information is kept in a thread-local slot, readable
//! through [`current_request_info`]. That's useful for debugging when
//! multiple internal requests run in the context of a single outer request:
//! include it in your log format and every line written during the dispatch
//! names the internal request that caused it. The tag is restored to its
//! previous value on every exit path out of [`execute`].
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade: a debug line when a dispatch
//! starts and a warning when a builder is dropped without ever having been
//! executed.
//!
//! [`execute`]: InternalRequest::execute
//! [`check_status`]: InternalRequest::check_status

mod context;
mod dispatch;
mod error;
mod mock;
mod request;

pub use context::current_request_info;
pub use dispatch::{DispatchError, RequestProcessor, ResourceResolver, Servlet, ServletResolver};
pub use error::{Error, ErrorKind};
pub use mock::{MockRequest, MockResponse, MockResource};
pub use request::{InternalRequest, DEFAULT_METHOD};
