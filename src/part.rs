use crate::constants;
use crate::helpers;
use bytes::Bytes;
use encoding_rs::UTF_8;
use http::header::{self, HeaderMap};
use memchr::memmem;
use std::time::{SystemTime, UNIX_EPOCH};

/// One fully delimited part, split into its named binary payload.
pub(crate) struct ExtractedPart {
    pub(crate) file_name: String,
    pub(crate) content_type: mime::Mime,
    pub(crate) body: Bytes,
}

/// Splits one delimited span into a header block and a binary body.
///
/// Returns `Ok(None)` for spans that carry no part data: the empty preamble
/// ahead of the first boundary, and malformed spans with no header/body
/// separator. The separator is located with a raw byte search so the body is
/// never decoded as text.
pub(crate) fn extract_part(span: &Bytes) -> crate::Result<Option<ExtractedPart>> {
    if span.is_empty() {
        return Ok(None);
    }

    let sep = match memmem::find(span, constants::CRLF_CRLF.as_bytes()) {
        Some(idx) => idx,
        None => {
            // The terminal epilogue never reaches the extractor, so a
            // non-empty span with no separator may be a truncated part.
            log::warn!("skipping a {}-byte part with no header/body separator", span.len());
            return Ok(None);
        }
    };

    // The span opens with the line ending that terminated the boundary line;
    // httparse must not see it or it would read an empty header block.
    let header_start = if span.starts_with(constants::CRLF.as_bytes()) {
        constants::CRLF.len()
    } else {
        0
    };
    let header_end = sep + constants::CRLF_CRLF.len();
    let header_bytes = &span[header_start..header_end];

    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    let headers = match httparse::parse_headers(header_bytes, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => {
            helpers::convert_raw_headers_to_header_map(raw_headers)?
        }
        Ok(httparse::Status::Partial) => return Err(crate::Error::IncompleteHeaders),
        Err(err) => return Err(crate::Error::ReadHeaderFailed(err)),
    };

    let file_name = parse_file_name(&headers).unwrap_or_else(fallback_file_name);
    let content_type = parse_content_type(&headers);

    let mut body = span.slice(header_end..);

    // Trim the framing line ending ahead of the next boundary. A payload that
    // genuinely ends in CRLF loses nothing: only this one is removed.
    if body.ends_with(constants::CRLF.as_bytes()) {
        body.truncate(body.len() - constants::CRLF.len());
    }

    Ok(Some(ExtractedPart {
        file_name,
        content_type,
        body,
    }))
}

fn parse_file_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_DISPOSITION)?;

    // Filenames may be non-ASCII; decode the raw header value leniently
    // instead of insisting on a visible-ASCII value.
    let (value, _, _) = UTF_8.decode(value.as_bytes());

    helpers::parse_quoted_param(&value, "filename")
}

fn parse_content_type(headers: &HeaderMap) -> mime::Mime {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.trim().parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn fallback_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    format!(
        "{}{}{}",
        constants::FALLBACK_FILE_NAME_PREFIX,
        millis,
        constants::FALLBACK_FILE_NAME_EXT
    )
}
