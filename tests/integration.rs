use bytes::Bytes;
use futures_util::stream;
use partstream::{DecodeSession, Error, PartStream, SessionState};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn two_png_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"--X123\r\n");
    body.extend_from_slice(b"Content-Disposition: attachment; filename=\"a.png\"\r\n");
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(&[0xFF; 10]);
    body.extend_from_slice(b"\r\n--X123\r\n");
    body.extend_from_slice(b"Content-Disposition: attachment; filename=\"b.png\"\r\n");
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(&[0x00; 20]);
    body.extend_from_slice(b"\r\n--X123--\r\n");
    body
}

fn chunked(data: Vec<u8>, size: usize) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> {
    let chunks: Vec<_> = data
        .chunks(size)
        .map(Bytes::copy_from_slice)
        .map(Result::Ok)
        .collect();
    stream::iter(chunks)
}

async fn collect_files(
    body: Vec<u8>,
    chunk_size: usize,
) -> Vec<(String, String, Bytes)> {
    let mut parts = PartStream::new(chunked(body, chunk_size), "X123");
    let mut files = Vec::new();

    while let Some(file) = parts.next_file().await.unwrap() {
        assert_eq!(file.index(), files.len());
        files.push((
            file.file_name().to_owned(),
            file.content_type().to_string(),
            file.into_bytes(),
        ));
    }

    files
}

#[tokio::test]
async fn test_two_parts_single_chunk() {
    let body = two_png_body();
    let len = body.len();
    let files = collect_files(body, len).await;

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].0, "a.png");
    assert_eq!(files[0].1, "image/png");
    assert_eq!(&files[0].2[..], &[0xFF; 10][..]);
    assert_eq!(files[1].0, "b.png");
    assert_eq!(files[1].1, "image/png");
    assert_eq!(&files[1].2[..], &[0x00; 20][..]);
}

#[tokio::test]
async fn test_chunk_size_does_not_change_output() {
    let single = collect_files(two_png_body(), two_png_body().len()).await;

    // Every re-chunking, including one-byte reads that split the boundary
    // marker itself across network reads, must decode identically.
    for size in [1usize, 2, 3, 6, 7, 64] {
        let rechunked = collect_files(two_png_body(), size).await;
        assert_eq!(rechunked.len(), single.len(), "chunk size {}", size);

        for (a, b) in single.iter().zip(rechunked.iter()) {
            assert_eq!(a.0, b.0, "chunk size {}", size);
            assert_eq!(a.1, b.1, "chunk size {}", size);
            assert_eq!(a.2, b.2, "chunk size {}", size);
        }
    }
}

#[tokio::test]
async fn test_missing_boundary_is_a_setup_error() {
    let stream = stream::iter(vec![Result::<Bytes, Infallible>::Ok(Bytes::from_static(b""))]);

    let err = DecodeSession::new(stream, "multipart/mixed").unwrap_err();
    assert_eq!(err, Error::NoBoundary);

    let stream = stream::iter(vec![Result::<Bytes, Infallible>::Ok(Bytes::from_static(b""))]);
    assert!(DecodeSession::new(stream, "application/json").is_err());
}

#[tokio::test]
async fn test_missing_filename_gets_generated_name() {
    let mut body = Vec::new();
    body.extend_from_slice(b"--X123\r\nContent-Type: image/png\r\n\r\n");
    body.extend_from_slice(&[0xAB; 5]);
    body.extend_from_slice(b"\r\n--X123--\r\n");

    let files = collect_files(body, 11).await;
    assert_eq!(files.len(), 1);

    // image_<unix-millis>.png
    let name = &files[0].0;
    let digits = name
        .strip_prefix("image_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .unwrap();
    assert!(!digits.is_empty());
    assert!(digits.bytes().all(|b| b.is_ascii_digit()));
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let mut body = Vec::new();
    body.extend_from_slice(b"--X123\r\nContent-Disposition: attachment; filename=\"raw.bin\"\r\n\r\n");
    body.extend_from_slice(b"data");
    body.extend_from_slice(b"\r\n--X123--\r\n");

    let files = collect_files(body, 9).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "raw.bin");
    assert_eq!(files[0].1, "application/octet-stream");
}

#[tokio::test]
async fn test_binary_body_survives_byte_for_byte() {
    // NULs, CR/LF runs, quotes and a near-marker prefix inside the payload.
    let mut payload = Vec::new();
    payload.extend_from_slice(b"\x00\x01\r\n\r\n\"quoted\"\r--X12 not-a-marker\n\xFE\xFF");
    payload.extend_from_slice(&[0x0D; 7]);

    let mut body = Vec::new();
    body.extend_from_slice(b"--X123\r\nContent-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&payload);
    body.extend_from_slice(b"\r\n--X123--\r\n");

    for size in [body.len(), 3] {
        let files = collect_files(body.clone(), size).await;
        assert_eq!(files.len(), 1);
        assert_eq!(&files[0].2[..], &payload[..]);
    }
}

#[tokio::test]
async fn test_terminal_epilogue_yields_nothing() {
    let files = collect_files(b"--X123--\r\n".to_vec(), 4).await;
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_preamble_junk_is_skipped() {
    let mut body = Vec::new();
    body.extend_from_slice(b"ignore this preamble\r\n--X123\r\n");
    body.extend_from_slice(b"Content-Disposition: attachment; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n");
    body.extend_from_slice(b"ok");
    body.extend_from_slice(b"\r\n--X123--\r\n");

    let files = collect_files(body, 13).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "a.png");
}

#[tokio::test]
async fn test_session_progress_is_monotonic() {
    let body = two_png_body();
    let counts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let counts_cb = Arc::clone(&counts);

    let mut session = DecodeSession::with_boundary(chunked(body, 6), "X123")
        .on_file(move |count, file| {
            assert!(!file.file_name().is_empty());
            counts_cb.lock().unwrap().push(count);
        });
    let handle = session.handle();

    session.run().await.unwrap();

    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.files().len(), 2);
    assert_eq!(handle.files_decoded(), 2);
    assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_transport_error_keeps_earlier_files() {
    // One complete part arrives, then the transport fails.
    let mut chunk = Vec::new();
    chunk.extend_from_slice(b"--X123\r\n");
    chunk.extend_from_slice(b"Content-Disposition: attachment; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n");
    chunk.extend_from_slice(&[0xFF; 10]);
    chunk.extend_from_slice(b"\r\n--X123\r\n");

    let stream = stream::iter(vec![
        Ok(Bytes::from(chunk)),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ]);

    let mut session = DecodeSession::with_boundary(stream, "X123");
    let err = session.run().await.unwrap_err();

    assert!(matches!(err, Error::StreamReadFailed(_)));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.files().len(), 1);
    assert_eq!(session.files()[0].file_name(), "a.png");
}

#[tokio::test]
async fn test_cancel_mid_stream() {
    let stream = stream::pending::<Result<Bytes, Infallible>>();
    let mut session = DecodeSession::with_boundary(stream, "X123");
    let handle = session.handle();

    let cancelled = Arc::new(AtomicUsize::new(0));
    let cancelled_task = Arc::clone(&cancelled);

    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handle.cancel();
        cancelled_task.store(1, Ordering::SeqCst);
    });

    let err = session.run().await.unwrap_err();

    assert_eq!(err, Error::Cancelled);
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(session.state(), SessionState::Cancelled);
    assert!(session.files().is_empty());
}

#[tokio::test]
async fn test_cancel_before_run() {
    let stream = stream::pending::<Result<Bytes, Infallible>>();
    let mut session = DecodeSession::with_boundary(stream, "X123");

    session.handle().cancel();

    assert_eq!(session.run().await.unwrap_err(), Error::Cancelled);
    assert_eq!(session.state(), SessionState::Cancelled);
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let body = two_png_body();
    let len = body.len();
    let mut session = DecodeSession::with_boundary(chunked(body, len), "X123");

    session.run().await.unwrap();
    assert_eq!(session.run().await.unwrap_err(), Error::SessionFinished);
    assert_eq!(session.into_files().len(), 2);
}
