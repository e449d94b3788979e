pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

/// Name given to a part whose headers carry no `filename="..."` parameter:
/// `image_<unix-millis>.png`.
pub(crate) const FALLBACK_FILE_NAME_PREFIX: &str = "image_";
pub(crate) const FALLBACK_FILE_NAME_EXT: &str = ".png";
