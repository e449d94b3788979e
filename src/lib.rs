//! An incremental decoder for `multipart/*` byte streams.
//!
//! `partstream` demultiplexes a chunked multipart response body into discrete
//! binary files as the bytes arrive, without buffering the whole body first.
//! Each part's header block yields a filename and content type (with sensible
//! defaults when absent) and the body is preserved byte for byte.
//!
//! # Examples
//!
//! ```
//! use partstream::PartStream;
//! use bytes::Bytes;
//! use std::convert::Infallible;
//! use futures_util::stream::once;
//!
//! # async fn run() {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: attachment; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
//! let mut parts = PartStream::new(stream, "X-BOUNDARY");
//!
//! while let Some(file) = parts.next_file().await.unwrap() {
//!     println!("{} ({}): {} bytes", file.file_name(), file.content_type(), file.len());
//! }
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run());
//! ```

pub use error::Error;
pub use file::DecodedFile;
pub use session::{DecodeSession, SessionHandle, SessionState};
pub use stream::PartStream;

mod buffer;
mod constants;
mod error;
mod file;
mod helpers;
mod part;
mod session;
mod stream;

/// A Result type often returned from methods that can have `partstream` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// Any `multipart/*` subtype is accepted; the image backend serves
/// `multipart/mixed`-style streams rather than form data.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if m.type_() != mime::MULTIPART {
        return Err(crate::Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(crate::Error::NoBoundary)
}
