use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};

pub const DEFAULT_CONFIG_DIR: &str = "config";

pub struct Config {
    /// Directory holding sources.yaml, schedules.yaml and storage.yaml
    pub config_dir: PathBuf,
    /// Serve the HTTP facade on this address when set
    pub listen_addr: Option<SocketAddr>,
    /// Overrides `run.max_duration_seconds` from schedules.yaml
    pub max_duration_secs: Option<f64>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config_dir = get("PRICEMONITOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        let listen_addr = get("PRICEMONITOR_LISTEN_ADDR")
            .map(|raw| {
                raw.trim()
                    .parse::<SocketAddr>()
                    .with_context(|| format!("Invalid PRICEMONITOR_LISTEN_ADDR '{}'", raw))
            })
            .transpose()?;

        let max_duration_secs = get("PRICEMONITOR_MAX_DURATION_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| anyhow!("Invalid PRICEMONITOR_MAX_DURATION_SECS '{}': {}", raw, e))
            })
            .transpose()?;

        let timeout_ms: u64 = get("PRICEMONITOR_REQUEST_TIMEOUT_MS")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(30000);

        Ok(Self {
            config_dir,
            listen_addr,
            max_duration_secs,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
