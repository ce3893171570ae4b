use crate::icap::response::ResponseHeader;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    MissingStatusLine,
    InvalidStatusCode,
}

/// Parses a raw frame (as returned by [`read_frame`](crate::icap::frame::read_frame))
/// into a [`ResponseHeader`].
///
/// The status code is the token between the first and second space of the
/// status line. Each following `Name: Value` line is split at its first colon
/// and both sides are trimmed; parsing stops at the first line without a
/// colon. A repeated header name keeps the last value.
pub fn parse_response_header(raw: &str) -> Result<ResponseHeader, ParseError> {
    let mut lines = raw.split("\r\n");

    // Status line
    let status_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or(ParseError::MissingStatusLine)?;

    let status = status_line
        .splitn(3, ' ')
        .nth(1)
        .map(str::trim)
        .ok_or(ParseError::InvalidStatusCode)?
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidStatusCode)?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            break;
        };

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(ResponseHeader::new(status, headers))
}
