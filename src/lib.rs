//! icap-client - ICAP content scanning client
//!
//! Submits file contents to an ICAP adaptation service (typically an
//! antivirus scanner) and reports whether the content is safe to pass on.

pub mod config;
pub mod error;
pub mod icap;
pub mod scanner;

pub use error::{IcapError, Result};
