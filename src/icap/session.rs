use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{IcapError, Result};
use crate::icap::frame::{read_frame, HTTP_TERMINATOR, ICAP_TERMINATOR};
use crate::icap::parser::parse_response_header;
use crate::icap::request::{options_request, RespmodBuilder};
use crate::icap::response::{IcapStatus, ResponseHeader};
use crate::icap::writer::{write_preview, write_remainder};

/// A byte stream a [`Session`] can run over.
pub trait Transport: Read + Write {
    /// Local endpoint reported in `X-Client-IP`.
    fn local_endpoint(&self) -> String;

    /// Shuts down both directions of the stream.
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn local_endpoint(&self) -> String {
        self.local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// One file to scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Logical file name, used in the embedded HTTP request line and in errors.
    pub file_name: String,
    /// MIME type written into the embedded HTTP response.
    pub mime_type: String,
    /// Raw file content.
    pub content: Bytes,
}

impl ScanRequest {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.content.len()
    }
}

/// States of one RESPMOD exchange.
///
/// ```text
/// PreviewSent ──ieof──────────────────────────────┐
///      │                                          ▼
///      └─► WaitingContinue ─100─► SendingRemainder ─► WaitingFinal ─► Done
///                 │ 200 / 204                                 │
///                 └──────────────────► Done ◄─────────────────┘
/// ```
#[derive(Debug)]
enum ScanState {
    PreviewSent,
    WaitingContinue,
    SendingRemainder,
    WaitingFinal,
    Done(bool),
}

/// An ICAP connection that has completed OPTIONS negotiation.
///
/// Scans run strictly one after another; the stream is shut down exactly once
/// when the session is dropped.
pub struct Session<S: Transport = TcpStream> {
    stream: S,
    config: ServerConfig,
    preview_size: usize,
    istag: Option<String>,
    broken: bool,
}

impl Session<TcpStream> {
    /// Connects to the configured server and negotiates the preview size.
    ///
    /// # Errors
    ///
    /// Returns [`IcapError::Setup`] if the host cannot be resolved, the
    /// connection fails, or OPTIONS does not yield status 200.
    pub fn connect(config: &ServerConfig) -> Result<Self> {
        let addr = resolve(&config.host, config.port)?;

        let stream = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|e| IcapError::Setup(format!("could not connect to {addr}: {e}")))?;

        stream
            .set_read_timeout(config.read_timeout())
            .map_err(|e| IcapError::Setup(format!("could not set read timeout: {e}")))?;

        debug!(%addr, "connected to ICAP server");

        Self::with_stream(stream, config)
    }

    /// A second handle on the socket, used to shut it down from another
    /// thread while a scan is blocked in a read.
    pub fn shutdown_handle(&self) -> Result<TcpStream> {
        Ok(self.stream.try_clone()?)
    }
}

impl<S: Transport> Session<S> {
    /// Negotiates over an already open stream.
    ///
    /// The stream is closed on failure.
    pub fn with_stream(stream: S, config: &ServerConfig) -> Result<Self> {
        let mut session = Self {
            stream,
            config: config.clone(),
            preview_size: 0,
            istag: None,
            broken: false,
        };

        session.negotiate()?;
        Ok(session)
    }

    /// Preview size agreed with the server during OPTIONS.
    pub fn preview_size(&self) -> usize {
        self.preview_size
    }

    /// `ISTag` from the OPTIONS reply, if the server sent one.
    pub fn istag(&self) -> Option<&str> {
        self.istag.as_deref()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn negotiate(&mut self) -> Result<()> {
        let request = options_request(
            &self.config.host,
            &self.config.service,
            &self.config.user_agent,
        );

        self.stream
            .write_all(request.as_bytes())
            .and_then(|_| self.stream.flush())
            .map_err(|e| IcapError::Setup(format!("could not send OPTIONS: {e}")))?;

        debug!(host = %self.config.host, "OPTIONS sent");

        let raw = read_frame(&mut self.stream, ICAP_TERMINATOR)
            .map_err(|e| IcapError::Setup(format!("could not get options from server: {e}")))?;

        let header = parse_response_header(&raw)
            .map_err(|e| IcapError::Setup(format!("could not get options from server: {e:?}")))?;

        if header.status() != IcapStatus::Ok {
            return Err(IcapError::Setup(format!(
                "could not get preview size from server (status {})",
                header.status_code()
            )));
        }

        self.preview_size = match header.preview() {
            Some(Ok(size)) => size,
            Some(Err(e)) => {
                return Err(IcapError::Setup(format!("invalid Preview header: {e}")));
            }
            None => 0,
        };
        self.istag = header.header("ISTag").map(str::to_string);

        info!(
            host = %self.config.host,
            preview = self.preview_size,
            istag = ?self.istag,
            "ICAP options negotiated"
        );

        Ok(())
    }

    /// Submits one file and returns whether it is safe to pass on.
    ///
    /// `Ok(false)` means the server blocked the file after the preview;
    /// [`IcapError::ContentRejected`] means the final adapted response was not
    /// a plain `HTTP/1.1 200`.
    pub fn scan(&mut self, request: &ScanRequest) -> Result<bool> {
        if self.broken {
            return Err(IcapError::Framing(
                "session is no longer usable after a failed exchange".to_string(),
            ));
        }

        let result = self.run_scan(request);

        match &result {
            Ok(clean) => info!(file = %request.file_name, clean, "scan finished"),
            Err(e) if e.is_rejection() => {
                warn!(file = %request.file_name, "content rejected by ICAP server");
            }
            Err(e) => {
                self.broken = true;
                warn!(file = %request.file_name, error = %e, "scan failed");
            }
        }

        result
    }

    fn run_scan(&mut self, request: &ScanRequest) -> Result<bool> {
        let content = &request.content[..];
        let header = RespmodBuilder::new(self.config.host.as_str(), self.config.port)
            .service(self.config.service.as_str())
            .origin_host(self.config.origin_host.as_str())
            .client_ip(self.stream.local_endpoint())
            .file_name(request.file_name.as_str())
            .mime_type(request.mime_type.as_str())
            .content_length(content.len())
            .preview_size(self.preview_size)
            .build();
        let preview_size = header.preview_size;
        let header_bytes = header.to_bytes();

        let mut state = ScanState::PreviewSent;

        loop {
            state = match state {
                ScanState::PreviewSent => {
                    self.stream.write_all(&header_bytes)?;
                    let complete = write_preview(&mut self.stream, content, preview_size)?;
                    self.stream.flush()?;

                    debug!(
                        file = %request.file_name,
                        length = content.len(),
                        preview = preview_size,
                        complete,
                        "preview sent"
                    );

                    if complete {
                        ScanState::WaitingFinal
                    } else {
                        ScanState::WaitingContinue
                    }
                }

                ScanState::WaitingContinue => {
                    let header = self.read_header()?;
                    let status = header.as_ref().map(ResponseHeader::status);
                    debug!(status = ?status, "preview response");

                    match status {
                        Some(IcapStatus::Continue) => ScanState::SendingRemainder,
                        Some(IcapStatus::Ok) => {
                            if let Some(header) = &header {
                                self.drain_encapsulated(header)?;
                            }
                            ScanState::Done(false)
                        }
                        Some(IcapStatus::NoContent) => ScanState::Done(true),
                        Some(IcapStatus::NotFound) => return Err(IcapError::ServiceNotFound),
                        other => {
                            return Err(IcapError::UnexpectedStatus {
                                status: other.map(|s| s.as_u16()),
                            });
                        }
                    }
                }

                ScanState::SendingRemainder => {
                    let remainder = &content[preview_size..];
                    write_remainder(&mut self.stream, remainder)?;

                    // The header goes out a second time after the body.
                    self.stream.write_all(&header_bytes)?;
                    self.stream.flush()?;

                    debug!(remaining = remainder.len(), "remainder sent");
                    ScanState::WaitingFinal
                }

                ScanState::WaitingFinal => {
                    let status = self.read_header()?.map(|h| h.status());
                    debug!(status = ?status, "final response");

                    match status {
                        Some(IcapStatus::NoContent) => ScanState::Done(true),
                        Some(IcapStatus::Ok) => {
                            let http = read_frame(&mut self.stream, HTTP_TERMINATOR)?;
                            if !http.contains("HTTP/1.1 200") {
                                return Err(IcapError::ContentRejected {
                                    file_name: request.file_name.clone(),
                                });
                            }
                            ScanState::Done(true)
                        }
                        other => {
                            return Err(IcapError::UnexpectedStatus {
                                status: other.map(|s| s.as_u16()),
                            });
                        }
                    }
                }

                ScanState::Done(clean) => return Ok(clean),
            };
        }
    }

    /// Reads one ICAP header. `None` when the status line has no usable code.
    fn read_header(&mut self) -> Result<Option<ResponseHeader>> {
        let raw = read_frame(&mut self.stream, ICAP_TERMINATOR)?;
        Ok(parse_response_header(&raw).ok())
    }

    /// Consumes the adapted HTTP response a 200 carries, so the next exchange
    /// starts on a fresh ICAP status line.
    fn drain_encapsulated(&mut self, header: &ResponseHeader) -> Result<()> {
        let encapsulated = header.header("Encapsulated").unwrap_or_default();

        // A body ends with the last chunk; a bare header block ends with a blank line.
        let terminator = if encapsulated.contains("res-body") {
            HTTP_TERMINATOR
        } else if encapsulated.contains("res-hdr") {
            ICAP_TERMINATOR
        } else {
            return Ok(());
        };

        let http = read_frame(&mut self.stream, terminator)?;
        debug!(len = http.len(), "encapsulated response discarded");

        Ok(())
    }
}

impl<S: Transport> Drop for Session<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stream.close() {
            debug!(error = %e, "ICAP stream shutdown failed");
        }
    }
}

/// Resolves `host` as a literal IP first, then through DNS, taking the first address.
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| {
            IcapError::Setup(format!(
                "'{host}' is neither a valid IP nor a reachable hostname"
            ))
        })
}
