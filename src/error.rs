//! ICAP client error types.
//!
//! Every failure a scan can end in is a distinct variant, so callers can
//! tell a transport fault from a rejected file without string matching.

use thiserror::Error;

/// ICAP client errors.
#[derive(Error, Debug)]
pub enum IcapError {
    /// Connection or OPTIONS negotiation failed. The session is unusable.
    #[error("ICAP setup failed: {0}")]
    Setup(String),

    /// The stream closed, or the frame buffer filled, before a terminator was seen.
    #[error("ICAP framing error: {0}")]
    Framing(String),

    /// The server answered 404 for the configured service.
    #[error("404: ICAP service not found")]
    ServiceNotFound,

    /// The server answered with a status the protocol does not expect here.
    #[error("{}", describe_status(.status))]
    UnexpectedStatus {
        /// The status code, if one could be parsed at all.
        status: Option<u16>,
    },

    /// The scanned file was judged unsafe.
    #[error("the file '{file_name}' is potentially dangerous")]
    ContentRejected {
        /// Logical name of the rejected file.
        file_name: String,
    },

    /// Socket I/O failed on an established session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IcapError {
    /// Whether this error is a verdict about the content rather than a fault.
    pub fn is_rejection(&self) -> bool {
        matches!(self, IcapError::ContentRejected { .. })
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("server returned unexpected status code: {code}"),
        None => "unrecognized or no status code in response header".to_string(),
    }
}

/// Result alias for ICAP operations.
pub type Result<T> = std::result::Result<T, IcapError>;
