use bytes::{BufMut, Bytes, BytesMut};

/// ICAP protocol version written on every request line.
pub const ICAP_VERSION: &str = "ICAP/1.0";

/// Default `User-Agent` for OPTIONS requests.
pub const USER_AGENT: &str = concat!("icap-client/", env!("CARGO_PKG_VERSION"));

/// Builds the OPTIONS request sent once when a session is set up.
///
/// # Example
///
/// ```
/// # use icap_client::icap::request::options_request;
/// let req = options_request("av.local", "", "agent/1.0");
/// assert!(req.starts_with("OPTIONS icap://av.local/ ICAP/1.0\r\n"));
/// assert!(req.ends_with("Encapsulated: null-body=0\r\n\r\n"));
/// ```
pub fn options_request(host: &str, service: &str, user_agent: &str) -> String {
    format!(
        "OPTIONS icap://{host}/{service} {ICAP_VERSION}\r\n\
         Host: {host}\r\n\
         User-Agent: {user_agent}\r\n\
         Encapsulated: null-body=0\r\n\
         \r\n"
    )
}

/// The header section of one RESPMOD exchange.
///
/// Holds the three blocks separately so the `Encapsulated` offsets can be
/// checked against what actually goes on the wire.
#[derive(Debug, Clone)]
pub struct RespmodHeader {
    /// Outer ICAP header block, including the blank line.
    pub icap: String,
    /// Synthetic embedded HTTP request header block.
    pub http_request: String,
    /// Synthetic embedded HTTP response header block.
    pub http_response: String,
    /// Preview size announced in the header and in the first chunk-size line.
    pub preview_size: usize,
}

impl RespmodHeader {
    /// Offset of the embedded response header, relative to the end of the ICAP block.
    pub fn res_hdr_offset(&self) -> usize {
        self.http_request.len()
    }

    /// Offset of the body, relative to the end of the ICAP block.
    pub fn res_body_offset(&self) -> usize {
        self.http_request.len() + self.http_response.len()
    }

    /// Serializes the header in wire order: ICAP block, embedded request,
    /// embedded response, then the preview chunk-size line.
    pub fn to_bytes(&self) -> Bytes {
        let size_line = format!("{:X}\r\n", self.preview_size);
        let mut buf = BytesMut::with_capacity(
            self.icap.len() + self.res_body_offset() + size_line.len(),
        );

        buf.put_slice(self.icap.as_bytes());
        buf.put_slice(self.http_request.as_bytes());
        buf.put_slice(self.http_response.as_bytes());
        buf.put_slice(size_line.as_bytes());

        buf.freeze()
    }
}

/// Builder for the RESPMOD request header.
///
/// # Example
///
/// ```
/// # use icap_client::icap::request::RespmodBuilder;
/// let header = RespmodBuilder::new("av.local", 1344)
///     .file_name("report.pdf")
///     .mime_type("application/pdf")
///     .content_length(4096)
///     .preview_size(1024)
///     .build();
///
/// assert!(header.icap.starts_with("RESPMOD icap://av.local:1344/ ICAP/1.0\r\n"));
/// assert!(header.icap.contains("Preview: 1024\r\n"));
/// ```
pub struct RespmodBuilder {
    host: String,
    port: u16,
    service: String,
    origin_host: String,
    client_ip: String,
    file_name: String,
    mime_type: String,
    content_length: usize,
    preview_size: usize,
}

impl RespmodBuilder {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            service: String::new(),
            origin_host: "localhost".to_string(),
            client_ip: String::new(),
            file_name: String::new(),
            mime_type: "application/octet-stream".to_string(),
            content_length: 0,
            preview_size: 0,
        }
    }

    /// ICAP resource path after the leading `/`.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Host written into the embedded HTTP request.
    pub fn origin_host(mut self, origin_host: impl Into<String>) -> Self {
        self.origin_host = origin_host.into();
        self
    }

    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn content_length(mut self, content_length: usize) -> Self {
        self.content_length = content_length;
        self
    }

    /// Clamped to the content length on build.
    pub fn preview_size(mut self, preview_size: usize) -> Self {
        self.preview_size = preview_size;
        self
    }

    pub fn build(self) -> RespmodHeader {
        let preview_size = self.preview_size.min(self.content_length);

        let http_request = format!(
            "GET /{} HTTP/1.1\r\nHost: {}\r\n\r\n",
            self.file_name, self.origin_host
        );

        let http_response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.mime_type, self.content_length
        );

        let icap = format!(
            "RESPMOD icap://{host}:{port}/{service} {ICAP_VERSION}\r\n\
             Allow: 204\r\n\
             Host: {host}\r\n\
             X-Client-IP: {client_ip}\r\n\
             Preview: {preview_size}\r\n\
             Encapsulated: req-hdr=0, res-hdr={res_hdr}, res-body={res_body}\r\n\
             \r\n",
            host = self.host,
            port = self.port,
            service = self.service,
            client_ip = self.client_ip,
            res_hdr = http_request.len(),
            res_body = http_request.len() + http_response.len(),
        );

        RespmodHeader {
            icap,
            http_request,
            http_response,
            preview_size,
        }
    }
}
