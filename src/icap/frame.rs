use std::io::{ErrorKind, Read};

use bytes::{BufMut, BytesMut};

use crate::error::{IcapError, Result};

/// Upper bound on a single header frame. Reads stop here no matter what the peer sends.
pub const MAX_FRAME_SIZE: usize = 8192;

/// Ends any ICAP or HTTP header block.
pub const ICAP_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Ends an HTTP chunked body.
pub const HTTP_TERMINATOR: &[u8] = b"0\r\n\r\n";

/// Bytes that must precede the terminator before matching starts, roughly one status line.
const MIN_STATUS_LINE: usize = 13;

/// Reads one frame from `stream`, a byte at a time, until the buffered bytes
/// end with `terminator`.
///
/// Reading one byte per call leaves whatever follows the terminator (the next
/// header, an encapsulated body) untouched in the stream.
///
/// The returned text includes the terminator. Bytes are decoded as Latin-1 so
/// that every byte maps to exactly one `char`.
///
/// # Errors
///
/// Returns [`IcapError::Framing`] if the stream closes or [`MAX_FRAME_SIZE`]
/// bytes are consumed before the terminator appears.
pub fn read_frame<R: Read>(stream: &mut R, terminator: &[u8]) -> Result<String> {
    let mut buffer = BytesMut::with_capacity(MAX_FRAME_SIZE);
    let mut byte = [0u8; 1];

    while buffer.len() < MAX_FRAME_SIZE {
        let n = match stream.read(&mut byte) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if n == 0 {
            return Err(IcapError::Framing(format!(
                "stream closed after {} bytes without terminator",
                buffer.len()
            )));
        }

        buffer.put_u8(byte[0]);

        if buffer.len() > terminator.len() + MIN_STATUS_LINE && buffer.ends_with(terminator) {
            tracing::trace!(len = buffer.len(), "frame received");
            return Ok(buffer.iter().map(|&b| b as char).collect());
        }
    }

    Err(IcapError::Framing(format!(
        "no terminator within {} bytes",
        MAX_FRAME_SIZE
    )))
}
