use crate::{DecodedFile, PartStream};
use bytes::Bytes;
use futures_util::future::poll_fn;
use futures_util::stream::Stream;
use spin::mutex::SpinMutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Poll, Waker};

/// Lifecycle state of a [`DecodeSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Reading,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug)]
struct Shared {
    state: SessionState,
    files_decoded: usize,
    waker: Option<Waker>,
}

type ProgressFn = Box<dyn FnMut(usize, &DecodedFile) + Send>;

/// Drives a [`PartStream`] to completion, collecting every decoded file in
/// arrival order and reporting progress as each one lands.
///
/// The session moves `Idle -> Reading -> Completed`, or to `Failed` on a
/// transport error and `Cancelled` when a [`SessionHandle`] cancels it (for
/// instance because the hosting view was torn down mid-stream). Files decoded
/// before a failure stay accessible through [`files`](DecodeSession::files).
///
/// # Examples
///
/// ```
/// use partstream::DecodeSession;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let body = "--B\r\nContent-Disposition: attachment; filename=\"out.png\"\r\nContent-Type: image/png\r\n\r\nfake image bytes\r\n--B--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(body)) });
///
/// let mut session = DecodeSession::new(stream, "multipart/mixed; boundary=B")
///     .unwrap()
///     .on_file(|count, file| println!("{} file(s), latest: {}", count, file.file_name()));
///
/// session.run().await.unwrap();
/// assert_eq!(session.files().len(), 1);
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct DecodeSession {
    stream: PartStream,
    files: Vec<DecodedFile>,
    on_file: Option<ProgressFn>,
    shared: Arc<SpinMutex<Shared>>,
}

impl std::fmt::Debug for DecodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSession")
            .field("files", &self.files)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl DecodeSession {
    /// Constructs a session from a chunk stream and the response's raw
    /// `Content-Type` header.
    ///
    /// Fails with a setup error before any byte is read when the header is
    /// not `multipart/*` or carries no `boundary=` attribute.
    pub fn new<S, O, E>(stream: S, content_type: &str) -> crate::Result<DecodeSession>
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let boundary = crate::parse_boundary(content_type)?;
        Ok(DecodeSession::with_boundary(stream, boundary))
    }

    /// Constructs a session from a chunk stream and an already resolved
    /// boundary token.
    pub fn with_boundary<S, O, E, B>(stream: S, boundary: B) -> DecodeSession
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
        B: Into<String>,
    {
        DecodeSession {
            stream: PartStream::new(stream, boundary),
            files: Vec::new(),
            on_file: None,
            shared: Arc::new(SpinMutex::new(Shared {
                state: SessionState::Idle,
                files_decoded: 0,
                waker: None,
            })),
        }
    }

    /// Registers a progress callback, invoked exactly once per decoded file
    /// with the running count (starting at 1) and the file itself.
    pub fn on_file<F>(mut self, on_file: F) -> DecodeSession
    where
        F: FnMut(usize, &DecodedFile) + Send + 'static,
    {
        self.on_file = Some(Box::new(on_file));
        self
    }

    /// Returns a cloneable handle for observing progress and cancelling the
    /// session from another task.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// The files decoded so far, in arrival order. Populated even when
    /// [`run`](DecodeSession::run) ends in failure.
    pub fn files(&self) -> &[DecodedFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<DecodedFile> {
        self.files
    }

    /// Reads the stream to its end, collecting every decoded file.
    ///
    /// Resolves with `Ok(())` once the transport reports end-of-stream and
    /// the final complete parts have been drained. A transport read error
    /// aborts the session; no retry is attempted here, user-facing messaging
    /// is the caller's job.
    pub async fn run(&mut self) -> crate::Result<()> {
        {
            let mut shared = self.shared.lock();
            match shared.state {
                SessionState::Idle => shared.state = SessionState::Reading,
                SessionState::Cancelled => return Err(crate::Error::Cancelled),
                _ => return Err(crate::Error::SessionFinished),
            }
        }

        loop {
            let stream = &mut self.stream;
            let shared = &self.shared;

            let next = poll_fn(|cx| {
                {
                    let mut shared = shared.lock();
                    if shared.state == SessionState::Cancelled {
                        return Poll::Ready(Err(crate::Error::Cancelled));
                    }
                    // Parked here between chunks; cancel() wakes us up.
                    shared.waker = Some(cx.waker().clone());
                }

                Pin::new(&mut *stream).poll_next(cx).map(Option::transpose)
            })
            .await;

            match next {
                Ok(Some(file)) => {
                    let count = {
                        let mut shared = self.shared.lock();
                        shared.files_decoded += 1;
                        shared.files_decoded
                    };

                    if let Some(on_file) = self.on_file.as_mut() {
                        on_file(count, &file);
                    }

                    self.files.push(file);
                }
                Ok(None) => {
                    self.shared.lock().state = SessionState::Completed;
                    return Ok(());
                }
                Err(err) => {
                    let mut shared = self.shared.lock();
                    if shared.state != SessionState::Cancelled {
                        shared.state = SessionState::Failed;
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// A cloneable view into a running [`DecodeSession`], fit for driving a
/// progress indicator or abandoning the read when its consumer goes away.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SpinMutex<Shared>>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Number of files decoded so far; increases by exactly one per file.
    pub fn files_decoded(&self) -> usize {
        self.shared.lock().files_decoded
    }

    /// Cancels the session. The in-flight read is abandoned and
    /// [`run`](DecodeSession::run) resolves with [`Error::Cancelled`](crate::Error::Cancelled)
    /// without touching the transport again. Cancelling a session that
    /// already completed or failed has no effect.
    pub fn cancel(&self) {
        let mut shared = self.shared.lock();
        match shared.state {
            SessionState::Completed | SessionState::Failed => {}
            _ => {
                shared.state = SessionState::Cancelled;
                if let Some(waker) = shared.waker.take() {
                    waker.wake();
                }
            }
        }
    }
}
