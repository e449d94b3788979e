use bytes::Bytes;
use futures_util::stream;
use partstream::DecodeSession;
use std::convert::Infallible;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fetch the generation response from somewhere, e.g. an inpaint endpoint.
    let (chunks, content_type) = get_response_from_somewhere();

    let stream = stream::iter(chunks.into_iter().map(Result::<Bytes, Infallible>::Ok));

    // A session resolves the boundary token once, then decodes files as the
    // chunks arrive, reporting each completed file for a progress indicator.
    let mut session = DecodeSession::new(stream, content_type)?
        .on_file(|count, file| println!("received file #{}: {}", count, file.file_name()));

    session.run().await?;

    for file in session.files() {
        println!("{} ({}): {} bytes", file.file_name(), file.content_type(), file.len());
    }

    Ok(())
}

// Stand-in for a real chunked HTTP response body.
fn get_response_from_somewhere() -> (Vec<Bytes>, &'static str) {
    let body = "--GEN\r\nContent-Disposition: attachment; filename=\"result_1.png\"\r\nContent-Type: image/png\r\n\r\nfirst image bytes\r\n--GEN\r\nContent-Type: image/png\r\n\r\nsecond image bytes\r\n--GEN--\r\n";

    // Deliver in small reads so boundaries straddle chunks.
    let chunks = body
        .as_bytes()
        .chunks(9)
        .map(Bytes::copy_from_slice)
        .collect();

    (chunks, "multipart/mixed; boundary=GEN")
}
