use std::fmt::{self, Debug, Display, Formatter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a multipart stream and in
/// other operations.
///
/// Setup errors (`DecodeContentType`, `NoMultipart`, `NoBoundary`, `NoBody`)
/// are raised before any byte of the body is read; `StreamReadFailed` aborts a
/// session mid-stream. A part lacking its header/body separator is not an
/// error at all: it is skipped with a warning.
#[non_exhaustive]
pub enum Error {
    /// Failed to convert the `Content-Type` to a [`mime::Mime`] type.
    DecodeContentType(mime::FromStrError),

    /// The `Content-Type` is not a `multipart/*` media type.
    NoMultipart,

    /// No boundary found in the `Content-Type` header.
    NoBoundary,

    /// The response carries no readable body. Raised at the transport edge
    /// before a session starts reading.
    NoBody,

    /// Stream read failed.
    StreamReadFailed(BoxError),

    /// Failed to read a part's headers.
    ReadHeaderFailed(httparse::Error),

    /// A part's header block ended before the terminating blank line.
    IncompleteHeaders,

    /// Failed to decode a part's raw header name to
    /// [`HeaderName`](http::header::HeaderName).
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode a part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue).
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// The session was cancelled through its [`SessionHandle`](crate::SessionHandle).
    Cancelled,

    /// `run()` was called on a session that already reached a terminal state.
    SessionFinished,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::DecodeContentType(err) => {
                write!(f, "failed to parse Content-Type as a mime type: {}", err)
            }
            Error::NoMultipart => write!(f, "Content-Type is not a multipart media type"),
            Error::NoBoundary => write!(f, "multipart boundary not found in Content-Type"),
            Error::NoBody => write!(f, "response has no readable body"),
            Error::StreamReadFailed(err) => write!(f, "stream read failed: {}", err),
            Error::ReadHeaderFailed(err) => write!(f, "failed to read part headers: {}", err),
            Error::IncompleteHeaders => write!(f, "failed to read complete part headers"),
            Error::DecodeHeaderName { name, cause } => {
                write!(f, "failed to decode part's raw header name: {:?} {}", name, cause)
            }
            Error::DecodeHeaderValue { cause, .. } => {
                write!(f, "failed to decode part's raw header value: {}", cause)
            }
            Error::Cancelled => write!(f, "decode session cancelled"),
            Error::SessionFinished => write!(f, "decode session already finished"),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
