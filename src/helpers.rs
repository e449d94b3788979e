use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;
use std::convert::TryFrom;

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: err.into(),
        })?;

        headers.insert(name, value);
    }

    Ok(headers)
}

/// Extracts a quoted parameter value, e.g. `filename="..."`, from a header
/// value. Empty values are treated as absent.
pub(crate) fn parse_quoted_param(input: &str, name: &str) -> Option<String> {
    let mut rest = input;

    while let Some(idx) = rest.find(name) {
        let after = &rest[idx + name.len()..];

        if let Some(after) = after.strip_prefix("=\"") {
            let end = after.find('"')?;
            if end == 0 {
                return None;
            }
            return Some(after[..end].to_owned());
        }

        rest = after;
    }

    None
}
