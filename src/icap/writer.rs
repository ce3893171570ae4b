use std::io::Write;

use crate::error::Result;

/// Closes a chunk's data.
pub const CRLF: &[u8] = b"\r\n";

/// Zero-length chunk that ends a preview when more body follows, or the full body.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Zero-length chunk declaring the whole file fit inside the preview.
pub const IEOF_CHUNK: &[u8] = b"0; ieof\r\n\r\n";

/// Hexadecimal chunk-size line for a chunk of `len` bytes.
///
/// ```
/// # use icap_client::icap::writer::chunk_size_line;
/// assert_eq!(chunk_size_line(9900), "26AC\r\n");
/// assert_eq!(chunk_size_line(0), "0\r\n");
/// ```
pub fn chunk_size_line(len: usize) -> String {
    format!("{:X}\r\n", len)
}

/// Writes `data` as one complete HTTP chunk: size line, data, CRLF.
pub fn write_chunk<W: Write>(stream: &mut W, data: &[u8]) -> Result<()> {
    stream.write_all(chunk_size_line(data.len()).as_bytes())?;
    stream.write_all(data)?;
    stream.write_all(CRLF)?;
    Ok(())
}

/// Writes the preview bytes that follow the RESPMOD header and closes the
/// preview according to how much content is left.
///
/// The header already carries the preview chunk-size line, so only the data
/// and its CRLF are written here. `preview_size` is clamped to the content
/// length. Returns `true` when the whole file was sent.
pub fn write_preview<W: Write>(stream: &mut W, content: &[u8], preview_size: usize) -> Result<bool> {
    let preview_size = preview_size.min(content.len());
    stream.write_all(&content[..preview_size])?;
    stream.write_all(CRLF)?;

    if content.len() <= preview_size {
        stream.write_all(IEOF_CHUNK)?;
        return Ok(true);
    }

    if preview_size != 0 {
        stream.write_all(LAST_CHUNK)?;
    }

    Ok(false)
}

/// Writes the bytes after the preview as a single chunk, then the last chunk.
pub fn write_remainder<W: Write>(stream: &mut W, remainder: &[u8]) -> Result<()> {
    write_chunk(stream, remainder)?;
    stream.write_all(LAST_CHUNK)?;
    stream.flush()?;
    Ok(())
}
