//! Configuration loading and task construction.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::de::DeserializeOwned;

use pricemonitor_market_data::{Instrument, ProviderKind, QuoteProvider, RegistryError};

use super::models::{
    AppConfig, ProviderConfig, SchedulesFile, SourcesFile, StorageFile, CSV_BACKEND,
};
use crate::errors::ConfigError;
use crate::scheduler::PollTask;

pub const SOURCES_FILE: &str = "sources.yaml";
pub const SCHEDULES_FILE: &str = "schedules.yaml";
pub const STORAGE_FILE: &str = "storage.yaml";

/// Read and parse one YAML file. An empty file yields the default value.
fn load_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load `sources.yaml`, `schedules.yaml` and `storage.yaml` from `config_dir`.
pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, ConfigError> {
    debug!("Loading configuration from {}", config_dir.display());

    let sources: SourcesFile = load_yaml(&config_dir.join(SOURCES_FILE))?;
    let schedules: SchedulesFile = load_yaml(&config_dir.join(SCHEDULES_FILE))?;
    let storage: StorageFile = load_yaml(&config_dir.join(STORAGE_FILE))?;

    if storage.storage.backend != CSV_BACKEND {
        return Err(ConfigError::InvalidValue {
            key: "storage.backend".to_string(),
            message: format!(
                "unsupported backend '{}', expected '{}'",
                storage.storage.backend, CSV_BACKEND
            ),
        });
    }

    // Fail early on bad retry settings rather than at run time.
    schedules.run.runner_config()?;

    let providers = sources
        .providers
        .into_iter()
        .map(|(name, entry)| {
            let kind = entry.kind.unwrap_or_else(|| name.clone());
            let config = ProviderConfig {
                name: name.clone(),
                kind,
                settings: entry.settings,
            };
            (name, config)
        })
        .collect();

    Ok(AppConfig {
        providers,
        instruments: sources.instruments,
        schedules: schedules.schedules,
        run: schedules.run,
        storage: storage.storage,
    })
}

/// Build every configured provider once, keyed by provider name.
pub fn build_providers(
    config: &AppConfig,
) -> Result<HashMap<String, Arc<dyn QuoteProvider>>, ConfigError> {
    let mut providers = HashMap::with_capacity(config.providers.len());

    for (name, provider) in &config.providers {
        let kind: ProviderKind = provider.kind.parse().map_err(|e| match e {
            RegistryError::UnknownKind(kind) => ConfigError::UnknownProviderKind {
                provider: name.clone(),
                kind,
            },
            other => ConfigError::Provider(other),
        })?;

        let built = kind.build(name, &provider.settings)?;
        providers.insert(name.clone(), built);
    }

    Ok(providers)
}

/// Instruments keyed by `(symbol, provider)`.
pub fn build_instruments(config: &AppConfig) -> HashMap<(String, String), Instrument> {
    config
        .instruments
        .iter()
        .map(|item| {
            (
                (item.symbol.clone(), item.provider.clone()),
                item.to_instrument(),
            )
        })
        .collect()
}

/// Turn every schedule into a [`PollTask`].
///
/// Fails with [`ConfigError::NoTasks`] when no schedules are configured.
pub fn build_tasks(config: &AppConfig) -> Result<Vec<PollTask>, ConfigError> {
    if config.schedules.is_empty() {
        return Err(ConfigError::NoTasks);
    }

    let providers = build_providers(config)?;
    let instruments = build_instruments(config);

    let mut tasks = Vec::with_capacity(config.schedules.len());
    for schedule in &config.schedules {
        let key = (schedule.symbol.clone(), schedule.provider.clone());
        let instrument = instruments
            .get(&key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingInstrument {
                symbol: schedule.symbol.clone(),
                provider: schedule.provider.clone(),
            })?;
        let provider = providers
            .get(&schedule.provider)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProvider(schedule.provider.clone()))?;

        tasks.push(PollTask::new(instrument, provider, schedule.interval_seconds)?);
    }

    info!(
        "Built {} poll tasks from {} providers",
        tasks.len(),
        providers.len()
    );
    Ok(tasks)
}
