use bytes::{Bytes, BytesMut};
use futures_util::stream::Stream;
use memchr::memmem;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Accumulates transport chunks and owns the unconsumed tail of the stream.
///
/// At all times `buf` holds exactly the suffix of the bytes received so far
/// that has not yet been cut at a boundary marker.
pub(crate) struct StreamBuffer {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    error: Option<crate::Error>,
    stream: Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>,
}

impl StreamBuffer {
    pub fn new(stream: Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>) -> Self {
        StreamBuffer {
            eof: false,
            buf: BytesMut::new(),
            error: None,
            stream,
        }
    }

    /// Drains every chunk the transport has ready into the buffer.
    ///
    /// A read error marks the stream as finished but is stashed rather than
    /// returned, so complete parts already buffered ahead of the failure can
    /// still be surfaced before the error is reported.
    pub fn poll_stream(&mut self, cx: &mut Context) {
        if self.eof {
            return;
        }

        loop {
            match self.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(data))) => self.buf.extend_from_slice(&data),
                Poll::Ready(Some(Err(err))) => {
                    self.eof = true;
                    self.error = Some(err);
                    return;
                }
                Poll::Ready(None) => {
                    self.eof = true;
                    return;
                }
                Poll::Pending => return,
            }
        }
    }

    /// Splits off everything before the first occurrence of `marker`,
    /// discarding the marker bytes themselves.
    ///
    /// Scanning always runs over the whole pending buffer, so a marker split
    /// across two transport reads is still found once its tail arrives.
    pub fn split_to_marker(&mut self, marker: &[u8]) -> Option<Bytes> {
        memmem::find(&self.buf, marker).map(|idx| {
            let span = self.buf.split_to(idx).freeze();

            // discard the marker bytes.
            drop(self.buf.split_to(marker.len()));

            span
        })
    }

    pub fn take_rest(&mut self) -> Bytes {
        self.buf.split_to(self.buf.len()).freeze()
    }

    pub fn take_error(&mut self) -> Option<crate::Error> {
        self.error.take()
    }
}
