//! Exporter configuration: command-line flags layered over an optional
//! TOML file layered over built-in defaults.
//!
//! ```toml
//! namespace = "nsq"
//!
//! [web]
//! listen = ":9117"
//! path = "/metrics"
//!
//! [nsqd]
//! addr = "http://localhost:4151/stats"
//! timeout = "5s"
//!
//! [log]
//! format = "json"
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

pub const DEFAULT_LISTEN: &str = ":9117";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_NSQD_ADDR: &str = "http://localhost:4151/stats";
pub const DEFAULT_NAMESPACE: &str = "nsq";

#[derive(Debug, Parser)]
#[command(
    name = "nsq-exporter",
    about = "Prometheus exporter for nsqd channel statistics",
    version
)]
pub struct Cli {
    /// Address on which to expose metrics and web interface [default: :9117]
    #[arg(long = "web.listen", value_name = "ADDR")]
    pub listen: Option<String>,

    /// Path under which to expose metrics [default: /metrics]
    #[arg(long = "web.path", value_name = "PATH")]
    pub metrics_path: Option<String>,

    /// Address of the nsqd stats endpoint [default: http://localhost:4151/stats]
    #[arg(long = "nsqd.addr", value_name = "URL")]
    pub nsqd_addr: Option<String>,

    /// Deadline for each nsqd request, e.g. 500ms, 5s, 1m [default: none]
    #[arg(long = "nsqd.timeout", value_name = "DURATION")]
    pub nsqd_timeout: Option<String>,

    /// Metric name prefix [default: nsq]
    #[arg(long)]
    pub namespace: Option<String>,

    /// Log output format [default: text]
    #[arg(long = "log.format", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Optional TOML config file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// On-disk configuration; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub web: WebSection,
    pub nsqd: NsqdSection,
    pub log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub listen: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NsqdSection {
    pub addr: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub format: Option<LogFormat>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Fully resolved exporter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterConfig {
    pub listen: SocketAddr,
    pub metrics_path: String,
    pub nsqd_addr: String,
    pub nsqd_timeout: Option<Duration>,
    pub namespace: String,
    pub log_format: LogFormat,
}

impl ExporterConfig {
    /// Merge flags over the config file (if any) over defaults.
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: Cli, file: FileConfig) -> anyhow::Result<Self> {
        let listen = cli
            .listen
            .or(file.web.listen)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let metrics_path = cli
            .metrics_path
            .or(file.web.path)
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
        let nsqd_timeout = match cli.nsqd_timeout.or(file.nsqd.timeout) {
            Some(s) => Some(
                parse_duration(&s).with_context(|| format!("invalid nsqd timeout {s:?}"))?,
            ),
            None => None,
        };

        Ok(Self {
            listen: parse_listen(&listen)?,
            metrics_path: nsq_api::normalize_metrics_path(&metrics_path)?,
            nsqd_addr: cli
                .nsqd_addr
                .or(file.nsqd.addr)
                .unwrap_or_else(|| DEFAULT_NSQD_ADDR.to_string()),
            nsqd_timeout,
            namespace: cli
                .namespace
                .or(file.namespace)
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            log_format: cli.log_format.or(file.log.format).unwrap_or_default(),
        })
    }
}

/// Parse a listen address. A bare `:port` binds all interfaces.
pub fn parse_listen(s: &str) -> anyhow::Result<SocketAddr> {
    let s = s.trim();
    let full = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };

    if let Ok(addr) = full.parse::<SocketAddr>() {
        return Ok(addr);
    }
    match full.to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => Ok(addr),
            None => bail!("listen address {s:?} resolved to nothing"),
        },
        Err(e) => bail!("invalid listen address {s:?}: {e}"),
    }
}

/// Parse a duration string like "5s", "500ms", "1m", or plain seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
