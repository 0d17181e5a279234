use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use pizzapulse_core::error::{PulseError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub metrics: MetricsSection,
}

impl PulseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PulseError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Longest decoded request path the chaos guard lets through.
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_path_len: default_max_path_len(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(PulseError::InvalidConfig(
                "server.listen must be a valid SocketAddr".into(),
            ));
        }
        if !(1..=65536).contains(&self.max_path_len) {
            return Err(PulseError::InvalidConfig(
                "server.max_path_len must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

/// Metrics sink settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Ingestion endpoint receiving one line per POST.
    pub url: String,
    /// Deployment identity, sent as the `source` tag on every line.
    pub source: String,
    pub user_id: String,
    pub api_key: String,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,

    #[serde(default = "default_max_concurrent_pushes")]
    pub max_concurrent_pushes: usize,
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)
            .map_err(|e| PulseError::InvalidConfig(format!("metrics.url is not a URL: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PulseError::InvalidConfig(
                "metrics.url must use http or https".into(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(PulseError::InvalidConfig("metrics.source must not be empty".into()));
        }
        if self.source.contains(['\n', '\r']) {
            return Err(PulseError::InvalidConfig(
                "metrics.source must be a single line".into(),
            ));
        }
        if self.user_id.is_empty() || self.api_key.is_empty() {
            return Err(PulseError::InvalidConfig(
                "metrics.user_id and metrics.api_key are required".into(),
            ));
        }
        if !(1000..=300000).contains(&self.flush_interval_ms) {
            return Err(PulseError::InvalidConfig(
                "metrics.flush_interval_ms must be between 1000 and 300000".into(),
            ));
        }
        if !(100..=10000).contains(&self.probe_timeout_ms) {
            return Err(PulseError::InvalidConfig(
                "metrics.probe_timeout_ms must be between 100 and 10000".into(),
            ));
        }
        if self.probe_timeout_ms >= self.flush_interval_ms {
            return Err(PulseError::InvalidConfig(
                "metrics.probe_timeout_ms must be less than flush_interval_ms".into(),
            ));
        }
        if !(100..=60000).contains(&self.push_timeout_ms) {
            return Err(PulseError::InvalidConfig(
                "metrics.push_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(1..=64).contains(&self.max_concurrent_pushes) {
            return Err(PulseError::InvalidConfig(
                "metrics.max_concurrent_pushes must be between 1 and 64".into(),
            ));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_max_path_len() -> usize {
    2000
}
fn default_flush_interval_ms() -> u64 {
    10000
}
fn default_probe_timeout_ms() -> u64 {
    1000
}
fn default_push_timeout_ms() -> u64 {
    5000
}
fn default_max_concurrent_pushes() -> usize {
    4
}
