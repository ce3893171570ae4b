//! Async facade over the blocking ICAP session.
//!
//! The protocol engine never times out on its own. `Scanner` moves each
//! blocking exchange onto tokio's blocking pool and bounds it with
//! [`tokio::time::timeout`], so a silent server cannot hang the caller.
//! When the deadline fires the socket is shut down through a cloned handle,
//! which fails the blocked read and lets the blocking thread finish.

use std::net::{Shutdown, TcpStream};
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use tokio::time::timeout;

use crate::config::Config;
use crate::icap::session::{ScanRequest, Session};

/// Scans files over one ICAP connection, one at a time.
pub struct Scanner {
    /// `None` once a scan has timed out and the session was abandoned.
    session: Option<Session>,
    /// Clone of the session socket, for shutting it down mid-scan.
    abort: TcpStream,
    deadline: Duration,
}

impl Scanner {
    /// Connects and negotiates on the blocking pool, bounded by the scan deadline.
    ///
    /// Unset socket read and connect timeouts default to the scan deadline.
    pub async fn connect(config: &Config) -> Result<Self> {
        let deadline = config.scan.timeout();
        let mut server = config.server.clone();
        // Zero is rejected by the socket API.
        if config.scan.timeout_secs > 0 {
            server.read_timeout_secs.get_or_insert(config.scan.timeout_secs);
            server.connect_timeout_secs.get_or_insert(config.scan.timeout_secs);
        }

        let session = timeout(
            deadline,
            tokio::task::spawn_blocking(move || Session::connect(&server)),
        )
        .await
        .context("ICAP connection timeout")?
        .context("ICAP connection task failed")??;

        tracing::info!(
            host = %session.config().host,
            port = session.config().port,
            preview = session.preview_size(),
            "scanner ready"
        );

        let abort = session.shutdown_handle()?;

        Ok(Self {
            session: Some(session),
            abort,
            deadline,
        })
    }

    pub fn preview_size(&self) -> Option<usize> {
        self.session.as_ref().map(Session::preview_size)
    }

    /// Reads `path` and scans it under its file name, guessing the MIME type
    /// from the extension.
    pub async fn scan_file(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        self.scan(ScanRequest::new(file_name, mime_type, Bytes::from(content)))
            .await
    }

    /// Scans in-memory content.
    ///
    /// Errors from the protocol engine are returned as [`crate::IcapError`]
    /// inside the `anyhow::Error`, so callers can downcast them.
    pub async fn scan(&mut self, request: ScanRequest) -> Result<bool> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| anyhow!("scanner session was abandoned after a timeout"))?;
        let file_name = request.file_name.clone();

        let task = tokio::task::spawn_blocking(move || {
            let result = session.scan(&request);
            (session, result)
        });

        let (session, result) = match timeout(self.deadline, task).await {
            Ok(joined) => joined.context("scan task failed")?,
            Err(_) => {
                tracing::warn!(file = %file_name, "scan deadline exceeded, closing connection");
                self.shutdown();
                bail!(
                    "scan of '{}' exceeded {}s deadline",
                    file_name,
                    self.deadline.as_secs()
                );
            }
        };

        self.session = Some(session);
        Ok(result?)
    }

    fn shutdown(&self) {
        if let Err(e) = self.abort.shutdown(Shutdown::Both) {
            tracing::debug!(error = %e, "ICAP stream shutdown failed");
        }
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        // A scan still running on the blocking pool owns the session; unblock it.
        if self.session.is_none() {
            self.shutdown();
        }
    }
}
