use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::icap::request::USER_AGENT;

/// Well-known ICAP port.
pub const DEFAULT_PORT: u16 = 1344;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub scan: ScanConfig,
}

/// Where the ICAP service lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or literal IP.
    pub host: String,
    pub port: u16,
    /// ICAP resource path, without the leading `/`.
    pub service: String,
    /// Host written into the synthetic HTTP request wrapped around each file.
    pub origin_host: String,
    pub user_agent: String,
    /// Socket read timeout. Reads block forever when unset.
    pub read_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            service: String::new(),
            origin_host: "localhost".to_string(),
            user_agent: USER_AGENT.to_string(),
            read_timeout_secs: None,
            connect_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Builds a server config from an `icap://host[:port]/[service]` URI.
    pub fn from_url(raw: &str) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_url(raw)?;
        Ok(cfg)
    }

    fn apply_url(&mut self, raw: &str) -> anyhow::Result<()> {
        let url = url::Url::parse(raw).with_context(|| format!("invalid ICAP URL '{raw}'"))?;

        if url.scheme() != "icap" {
            bail!("unsupported scheme '{}', expected icap://", url.scheme());
        }

        self.host = url
            .host_str()
            .context("ICAP URL missing host")?
            .trim_matches(|c| c == '[' || c == ']')
            .to_string();
        self.port = url.port().unwrap_or(DEFAULT_PORT);
        self.service = url.path().trim_start_matches('/').to_string();

        Ok(())
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Deadline for one scan when run through the async scanner.
    pub timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Loads the YAML file named by `ICAP_CONFIG` (defaults when unset), then
    /// applies `ICAP_URL`, `ICAP_HOST` and `ICAP_PORT` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("ICAP_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(raw) = std::env::var("ICAP_URL") {
            cfg.server.apply_url(&raw)?;
        }

        if let Ok(host) = std::env::var("ICAP_HOST") {
            cfg.server.host = host;
        }

        if let Ok(port) = std::env::var("ICAP_PORT") {
            cfg.server.port = port
                .parse()
                .with_context(|| format!("invalid ICAP_PORT '{port}'"))?;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overrides the server from an `icap://` URI.
    pub fn with_url(mut self, raw: &str) -> anyhow::Result<Self> {
        self.server.apply_url(raw)?;
        Ok(self)
    }
}
