//! Configuration file models.
//!
//! Three YAML files live in the configuration directory:
//! - `sources.yaml` - providers and instruments
//! - `schedules.yaml` - poll schedules and run settings
//! - `storage.yaml` - storage backend

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pricemonitor_market_data::{AssetClass, Instrument, ProviderSettings};

use crate::errors::ConfigError;
use crate::scheduler::{BackoffConfig, RetryPolicy, RunnerConfig};

/// Storage backend supported by this build.
pub const CSV_BACKEND: &str = "csv";

// =============================================================================
// sources.yaml
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEntry {
    /// Provider kind; defaults to the provider's name
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub settings: ProviderSettings,
}

/// A configured provider instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: String,
    pub settings: ProviderSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub provider: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl InstrumentConfig {
    pub fn to_instrument(&self) -> Instrument {
        Instrument {
            symbol: self.symbol.clone(),
            asset_class: self.asset_class,
            exchange: self.exchange.clone(),
            base: self.base.clone(),
            quote: self.quote.clone(),
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// schedules.yaml
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulesFile {
    #[serde(default)]
    pub schedules: Vec<ScheduleConfig>,
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleConfig {
    pub symbol: String,
    pub provider: String,
    pub interval_seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RunSettings {
    /// Absent or non-positive means run until shutdown
    #[serde(default)]
    pub max_duration_seconds: Option<f64>,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicyKind {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub policy: RetryPolicyKind,
    #[serde(default)]
    pub base_seconds: Option<f64>,
    #[serde(default)]
    pub cap_seconds: Option<f64>,
    #[serde(default)]
    pub jitter: Option<f64>,
}

impl RetrySettings {
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        match self.policy {
            RetryPolicyKind::Fixed => Ok(RetryPolicy::Fixed),
            RetryPolicyKind::Exponential => {
                let defaults = BackoffConfig::default();
                let base = positive_duration("run.retry.base_seconds", self.base_seconds)?
                    .unwrap_or(defaults.base);
                let cap = positive_duration("run.retry.cap_seconds", self.cap_seconds)?
                    .unwrap_or(defaults.cap);
                let jitter = match self.jitter {
                    Some(j) if !(0.0..=1.0).contains(&j) => {
                        return Err(ConfigError::InvalidValue {
                            key: "run.retry.jitter".to_string(),
                            message: format!("{} is outside [0, 1]", j),
                        })
                    }
                    Some(j) => j,
                    None => defaults.jitter,
                };
                Ok(RetryPolicy::Exponential(BackoffConfig { base, cap, jitter }))
            }
        }
    }
}

impl RunSettings {
    pub fn runner_config(&self) -> Result<RunnerConfig, ConfigError> {
        Ok(RunnerConfig::default()
            .with_max_duration_secs(self.max_duration_seconds)
            .with_retry(self.retry.to_policy()?))
    }
}

fn positive_duration(key: &str, seconds: Option<f64>) -> Result<Option<Duration>, ConfigError> {
    match seconds {
        None => Ok(None),
        Some(s) if s.is_finite() && s > 0.0 => Duration::try_from_secs_f64(s)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Some(s) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{} must be a positive number of seconds", s),
        }),
    }
}

// =============================================================================
// storage.yaml
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageFile {
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: default_root(),
        }
    }
}

fn default_backend() -> String {
    CSV_BACKEND.to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}

// =============================================================================
// AppConfig
// =============================================================================

/// Everything loaded from the configuration directory.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub providers: BTreeMap<String, ProviderConfig>,
    pub instruments: Vec<InstrumentConfig>,
    pub schedules: Vec<ScheduleConfig>,
    pub run: RunSettings,
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Look up a configured instrument by symbol, ignoring case.
    pub fn find_instrument(&self, symbol: &str) -> Option<Instrument> {
        self.instruments
            .iter()
            .find(|i| i.symbol.eq_ignore_ascii_case(symbol))
            .map(InstrumentConfig::to_instrument)
    }
}
