use crate::buffer::StreamBuffer;
use crate::constants;
use crate::part;
use crate::DecodedFile;
use bytes::Bytes;
use futures_util::stream::{Stream, TryStreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

/// Decodes a `multipart/*` byte stream into [`DecodedFile`] instances as the
/// bytes arrive.
///
/// The source stream is cut at every occurrence of the boundary marker
/// (`--<boundary>`); each delimited span is split into a header block and a
/// binary body, and every well-formed span yields exactly one file, in the
/// order the backend emitted them. The empty span ahead of the first boundary
/// and the terminal epilogue yield nothing.
///
/// Files can be pulled through the [`Stream`] implementation or
/// [`next_file`](PartStream::next_file).
///
/// # Examples
///
/// ```
/// use partstream::PartStream;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: attachment; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut parts = PartStream::new(stream, "X-BOUNDARY");
///
/// while let Some(file) = parts.next_file().await.unwrap() {
///     println!("{}: {:?}", file.file_name(), file.data());
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct PartStream {
    buffer: StreamBuffer,
    marker: Bytes,
    next_idx: usize,
    done: bool,
}

impl PartStream {
    /// Constructs a new `PartStream` from a chunk stream and the boundary
    /// token resolved via [`parse_boundary`](crate::parse_boundary).
    pub fn new<S, O, E, B>(stream: S, boundary: B) -> PartStream
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
        B: Into<String>,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        PartStream {
            buffer: StreamBuffer::new(Box::pin(stream)),
            marker: Bytes::from(format!("{}{}", constants::BOUNDARY_EXT, boundary.into())),
            next_idx: 0,
            done: false,
        }
    }

    /// Constructs a new `PartStream` from an [`AsyncRead`] reader and the
    /// boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    pub fn with_reader<R, B>(reader: R, boundary: B) -> PartStream
    where
        R: AsyncRead + Send + 'static,
        B: Into<String>,
    {
        let stream = ReaderStream::new(reader);
        PartStream::new(stream, boundary)
    }

    /// Yields the next [`DecodedFile`] if available.
    pub async fn next_file(&mut self) -> crate::Result<Option<DecodedFile>> {
        self.try_next().await
    }
}

impl Stream for PartStream {
    type Item = Result<DecodedFile, crate::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            // Cut every complete part already buffered before touching the
            // transport again; a single chunk may hold several parts.
            while let Some(span) = this.buffer.split_to_marker(&this.marker) {
                match part::extract_part(&span) {
                    Ok(Some(extracted)) => {
                        let idx = this.next_idx;
                        this.next_idx += 1;

                        log::trace!("decoded part {}: {} bytes", idx, extracted.body.len());

                        return Poll::Ready(Some(Ok(DecodedFile::new(extracted, idx))));
                    }
                    Ok(None) => continue,
                    Err(err) => {
                        this.done = true;
                        return Poll::Ready(Some(Err(err)));
                    }
                }
            }

            if this.buffer.eof {
                this.done = true;

                if let Some(err) = this.buffer.take_error() {
                    return Poll::Ready(Some(Err(err)));
                }

                // Whatever trails the final boundary is the epilogue, not
                // part data.
                drop(this.buffer.take_rest());

                return Poll::Ready(None);
            }

            let buffered = this.buffer.buf.len();
            this.buffer.poll_stream(cx);

            if !this.buffer.eof && this.buffer.buf.len() == buffered {
                return Poll::Pending;
            }
        }
    }
}
