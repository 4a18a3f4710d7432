use std::error::Error as ErrorTrait;
use std::fmt::Display;

///
/// Contains information about an error occurence
///
#[derive(Debug)]
pub struct Error {
    /// The type of this error
    pub kind: ErrorKind,
    /// Some errors come with more context
    pub context: Option<String>,
    source: Option<Box<dyn ErrorTrait + Send + Sync>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error {
            kind,
            context: None,
            source: None,
        }
    }

    pub(crate) fn new_with_context(kind: ErrorKind, context: impl Display) -> Error {
        Error {
            kind,
            context: Some(context.to_string()),
            source: None,
        }
    }

    pub(crate) fn new_with_source(
        kind: ErrorKind,
        source: Box<dyn ErrorTrait + Send + Sync>,
    ) -> Error {
        Error {
            kind,
            context: Some(source.to_string()),
            source: Some(source),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (context: {})",
            self.kind.description(),
            self.context.as_ref().unwrap_or(&"none".to_string())
        )
    }
}

impl ErrorTrait for Error {
    fn source(&self) -> Option<&(dyn ErrorTrait + 'static)> {
        self.source.as_ref().map(|source| {
            let source: &(dyn ErrorTrait + 'static) = &**source;
            source
        })
    }
}

///
/// The type of an error
///
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was already executed
    AlreadyExecuted,
    /// The request has not been executed yet
    NotYetExecuted,
    /// The response status is not in the accepted set
    UnexpectedStatus,
    /// The response content type is not the expected one
    ContentTypeMismatch,
    /// The status code is invalid or out of range
    InvalidStatusCode,
    /// Failed to read the request body
    RequestBodyFailure,
    /// Failed to decode the response body
    ResponseBodyFailure,
    /// The delegated dispatch failed
    Dispatch,
}

impl ErrorKind {
    fn description(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExecuted => "the request was already executed",
            ErrorKind::NotYetExecuted => "the request has not been executed yet",
            ErrorKind::UnexpectedStatus => "unexpected response status",
            ErrorKind::ContentTypeMismatch => "unexpected response content type",
            ErrorKind::InvalidStatusCode => "invalid status code",
            ErrorKind::RequestBodyFailure => "failed to read the request body",
            ErrorKind::ResponseBodyFailure => "failed to decode the response body",
            ErrorKind::Dispatch => "the delegated dispatch failed",
        }
    }
}
