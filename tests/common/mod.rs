//! Shared test doubles for ICAP sessions.
#![allow(dead_code)]

use std::io::{self, Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use icap_client::config::ServerConfig;
use icap_client::icap::session::Transport;

pub const CLIENT_ENDPOINT: &str = "10.0.0.7:50123";

pub const OPTIONS_OK: &str =
    "ICAP/1.0 200 OK\r\nMethods: RESPMOD\r\nPreview: 100\r\nISTag: \"abc-1\"\r\n\r\n";

/// In-memory transport that replays a scripted server reply and records
/// everything the client writes.
pub struct MockTransport {
    input: Cursor<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
    closes: Arc<AtomicUsize>,
}

/// Handle for inspecting a [`MockTransport`] after the session took ownership.
#[derive(Clone)]
pub struct MockHandle {
    written: Arc<Mutex<Vec<u8>>>,
    closes: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new(replies: &[&str]) -> (Self, MockHandle) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));

        let transport = Self {
            input: Cursor::new(replies.concat().into_bytes()),
            written: written.clone(),
            closes: closes.clone(),
        };

        (transport, MockHandle { written, closes })
    }
}

impl MockHandle {
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.written.lock().unwrap().clear();
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn local_endpoint(&self) -> String {
        CLIENT_ENDPOINT.to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        host: "av.test".to_string(),
        port: 1344,
        ..ServerConfig::default()
    }
}

/// Binds a one-shot ICAP stub on localhost.
///
/// The stub writes `replies` as soon as a client connects, then records
/// everything the client sends until the client shuts the connection down.
pub fn spawn_stub(replies: &[&str]) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let script = replies.concat();

    let handle = std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        socket.write_all(script.as_bytes()).unwrap();

        let mut received = Vec::new();
        let _ = socket.read_to_end(&mut received);
        received
    });

    (addr, handle)
}
