use partstream::PartStream;
use tokio::io::AsyncRead;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the boundary from somewhere e.g. a response body.
    let (reader, boundary) = get_async_reader_from_somewhere().await;

    // Create a `PartStream` from that async reader and the boundary.
    let mut parts = PartStream::with_reader(reader, boundary);

    // Iterate over the files, use `next_file()` to get the next one.
    while let Some(file) = parts.next_file().await? {
        println!(
            "{} ({}): {} bytes",
            file.file_name(),
            file.content_type(),
            file.len()
        );
    }

    Ok(())
}

async fn get_async_reader_from_somewhere() -> (impl AsyncRead + Send, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: attachment; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nfake png bytes\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "X-BOUNDARY")
}
