//! ICAP protocol implementation.
//!
//! This module implements the client side of ICAP (RFC 3507) for a single
//! use: wrapping a file as a synthetic HTTP response, submitting it with
//! RESPMOD and Preview, and turning the reply into a verdict.
//!
//! # Architecture
//!
//! - **`frame`**: bounded, byte-at-a-time reads up to a terminator
//! - **`parser`**: turns a raw frame into a status code and header map
//! - **`response`**: parsed response header and status classification
//! - **`request`**: OPTIONS and RESPMOD request builders
//! - **`writer`**: chunked body framing for preview and remainder
//! - **`session`**: connection setup, OPTIONS negotiation and the scan state machine
//!
//! # Scan State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │   PreviewSent    │ ← Header + first `preview` bytes written
//!        └──────┬───────────┘
//!               ├─ whole file sent (ieof) ─────────────┐
//!               ▼                                      │
//!        ┌──────────────────┐                          │
//!        │ WaitingContinue  │ ← 200 → blocked          │
//!        └──────┬───────────┘   204 → clean            │
//!               │ 100 Continue                         │
//!               ▼                                      │
//!        ┌──────────────────┐                          │
//!        │ SendingRemainder │ ← Rest of file, 1 chunk  │
//!        └──────┬───────────┘                          │
//!               ▼                                      │
//!        ┌──────────────────┐                          │
//!        │   WaitingFinal   │ ◄────────────────────────┘
//!        └──────┬───────────┘
//!               ├─ 204 → clean
//!               └─ 200 → inspect encapsulated HTTP status
//! ```
//!
//! # Example
//!
//! ```ignore
//! use icap_client::config::ServerConfig;
//! use icap_client::icap::session::{ScanRequest, Session};
//!
//! fn main() -> anyhow::Result<()> {
//!     let cfg = ServerConfig::from_url("icap://127.0.0.1:1344/avscan")?;
//!     let mut session = Session::connect(&cfg)?;
//!
//!     let request = ScanRequest::new("eicar.com", "application/octet-stream", b"...".to_vec());
//!     println!("clean: {}", session.scan(&request)?);
//!     Ok(())
//! }
//! ```

pub mod frame;
pub mod parser;
pub mod request;
pub mod response;
pub mod session;
pub mod writer;

pub use response::{IcapStatus, ResponseHeader};
pub use session::{ScanRequest, Session, Transport};
