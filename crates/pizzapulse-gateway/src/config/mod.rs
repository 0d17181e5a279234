//! Config loader (strict parsing).
//!
//! Read once at startup; there is no hot reload.

pub mod schema;

use std::fs;

use pizzapulse_core::error::{PulseError, Result};

pub use schema::{MetricsSection, PulseConfig, ServerSection};

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "PIZZAPULSE_CONFIG";

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "pizzapulse.yaml";

pub fn load_from_file(path: &str) -> Result<PulseConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PulseError::InvalidConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PulseConfig> {
    let cfg: PulseConfig = serde_yaml::from_str(s)
        .map_err(|e| PulseError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Path from `PIZZAPULSE_CONFIG`, falling back to `pizzapulse.yaml`.
pub fn resolve_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
