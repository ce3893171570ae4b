use std::collections::HashMap;

/// ICAP status codes the client acts on.
///
/// ICAP reuses HTTP numeric codes. Only these four drive the scan protocol:
/// - `Continue` (100): send the rest of the body
/// - `Ok` (200): content was adapted, inspect the encapsulated response
/// - `NoContent` (204): content is unmodified
/// - `NotFound` (404): the ICAP service does not exist
///
/// Anything else is carried as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcapStatus {
    /// 100 Continue
    Continue,
    /// 200 OK
    Ok,
    /// 204 No Content
    NoContent,
    /// 404 Not Found
    NotFound,
    /// Any code the client has no branch for
    Other(u16),
}

impl IcapStatus {
    /// Classifies a numeric status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use icap_client::icap::response::IcapStatus;
    /// assert_eq!(IcapStatus::from_u16(204), IcapStatus::NoContent);
    /// assert_eq!(IcapStatus::from_u16(500), IcapStatus::Other(500));
    /// ```
    pub fn from_u16(code: u16) -> Self {
        match code {
            100 => IcapStatus::Continue,
            200 => IcapStatus::Ok,
            204 => IcapStatus::NoContent,
            404 => IcapStatus::NotFound,
            other => IcapStatus::Other(other),
        }
    }

    /// Returns the numeric status code.
    pub fn as_u16(&self) -> u16 {
        match self {
            IcapStatus::Continue => 100,
            IcapStatus::Ok => 200,
            IcapStatus::NoContent => 204,
            IcapStatus::NotFound => 404,
            IcapStatus::Other(code) => *code,
        }
    }
}

/// A parsed ICAP (or encapsulated HTTP) response header.
///
/// Produced once per exchange and never modified afterwards.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    status: u16,
    headers: HashMap<String, String>,
}

impl ResponseHeader {
    pub(crate) fn new(status: u16, headers: HashMap<String, String>) -> Self {
        Self { status, headers }
    }

    /// The numeric status code from the status line.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// The status code classified for protocol branching.
    pub fn status(&self) -> IcapStatus {
        IcapStatus::from_u16(self.status)
    }

    /// Looks up a header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(|v| v.as_str())
    }

    /// All parsed headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The negotiated `Preview` size, if the header is present.
    ///
    /// Returns `Some(Err(_))` when the header exists but is not a number.
    pub fn preview(&self) -> Option<Result<usize, std::num::ParseIntError>> {
        self.header("Preview").map(|v| v.parse())
    }
}
