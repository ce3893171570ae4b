use std::io::{self, Cursor, Read};

use icap_client::icap::frame::{read_frame, HTTP_TERMINATOR, ICAP_TERMINATOR, MAX_FRAME_SIZE};
use icap_client::IcapError;

/// Endless stream of one byte that counts how much was pulled from it.
struct Endless {
    byte: u8,
    consumed: usize,
}

impl Read for Endless {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        for b in buf.iter_mut() {
            *b = self.byte;
        }
        self.consumed += buf.len();
        Ok(buf.len())
    }
}

#[test]
fn test_frame_includes_terminator() {
    let mut stream = Cursor::new(b"ICAP/1.0 100 Continue\r\n\r\n".to_vec());
    let frame = read_frame(&mut stream, ICAP_TERMINATOR).unwrap();

    assert_eq!(frame, "ICAP/1.0 100 Continue\r\n\r\n");
}

#[test]
fn test_frame_leaves_following_bytes_in_stream() {
    let raw = b"ICAP/1.0 100 Continue\r\n\r\nICAP/1.0 204 No Content\r\n\r\n";
    let mut stream = Cursor::new(raw.to_vec());

    let first = read_frame(&mut stream, ICAP_TERMINATOR).unwrap();
    let second = read_frame(&mut stream, ICAP_TERMINATOR).unwrap();

    assert_eq!(first, "ICAP/1.0 100 Continue\r\n\r\n");
    assert_eq!(second, "ICAP/1.0 204 No Content\r\n\r\n");
}

#[test]
fn test_frame_http_terminator_spans_header_and_body() {
    let raw = "HTTP/1.1 403 Forbidden\r\nContent-Type: text/html\r\n\r\n5\r\nblock\r\n0\r\n\r\n";
    let mut stream = Cursor::new(raw.as_bytes().to_vec());

    let frame = read_frame(&mut stream, HTTP_TERMINATOR).unwrap();

    assert_eq!(frame, raw);
}

#[test]
fn test_frame_decodes_high_bytes_as_latin1() {
    let mut raw = b"ICAP/1.0 200 OK\r\nX-Name: caf".to_vec();
    raw.push(0xE9);
    raw.extend_from_slice(b"\r\n\r\n");
    let mut stream = Cursor::new(raw);

    let frame = read_frame(&mut stream, ICAP_TERMINATOR).unwrap();

    assert!(frame.contains("café"));
}

#[test]
fn test_frame_stream_closed_before_terminator() {
    let mut stream = Cursor::new(b"ICAP/1.0 200 OK\r\nISTag: x\r\n".to_vec());
    let err = read_frame(&mut stream, ICAP_TERMINATOR).unwrap_err();

    assert!(matches!(err, IcapError::Framing(_)));
}

#[test]
fn test_frame_empty_stream() {
    let mut stream = Cursor::new(Vec::new());
    let err = read_frame(&mut stream, ICAP_TERMINATOR).unwrap_err();

    assert!(matches!(err, IcapError::Framing(_)));
}

#[test]
fn test_frame_never_reads_past_bound() {
    let mut stream = Endless { byte: b'A', consumed: 0 };
    let err = read_frame(&mut stream, ICAP_TERMINATOR).unwrap_err();

    assert!(matches!(err, IcapError::Framing(_)));
    assert_eq!(stream.consumed, MAX_FRAME_SIZE);
}

#[test]
fn test_frame_terminator_at_exact_bound() {
    let mut raw = vec![b'A'; MAX_FRAME_SIZE - ICAP_TERMINATOR.len()];
    raw.extend_from_slice(ICAP_TERMINATOR);
    raw.extend_from_slice(b"extra");
    let mut stream = Cursor::new(raw);

    let frame = read_frame(&mut stream, ICAP_TERMINATOR).unwrap();

    assert_eq!(frame.len(), MAX_FRAME_SIZE);
}
