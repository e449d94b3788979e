use crate::part::ExtractedPart;
use bytes::Bytes;
use std::fmt::{self, Debug, Formatter};

/// A single file decoded out of the multipart stream: binary payload plus the
/// filename and content type announced in the part's header block.
///
/// Files are immutable once created and carry the index of their arrival
/// position, which is also the order the backend emitted them.
pub struct DecodedFile {
    data: Bytes,
    file_name: String,
    content_type: mime::Mime,
    idx: usize,
}

impl DecodedFile {
    pub(crate) fn new(part: ExtractedPart, idx: usize) -> Self {
        DecodedFile {
            data: part.body,
            file_name: part.file_name,
            content_type: part.content_type,
            idx,
        }
    }

    /// The file's name, either taken from the part's `filename="..."`
    /// parameter or synthesized as `image_<unix-millis>.png`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The part's `Content-Type`, defaulting to `application/octet-stream`.
    pub fn content_type(&self) -> &mime::Mime {
        &self.content_type
    }

    /// The raw payload bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consumes the file, returning its payload.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-based arrival position within the stream.
    pub fn index(&self) -> usize {
        self.idx
    }
}

impl Debug for DecodedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .field("idx", &self.idx)
            .finish()
    }
}
