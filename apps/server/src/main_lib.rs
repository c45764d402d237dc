use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use pricemonitor_core::config::{build_tasks, load_app_config, AppConfig};
use pricemonitor_core::market_data::{AssetClass, Instrument};
use pricemonitor_core::{PollTask, QuoteStore, Runner};
use pricemonitor_storage_csv::CsvQuoteStore;

use crate::config::Config;

pub struct AppState {
    pub store: Arc<dyn QuoteStore>,
    pub app_config: AppConfig,
}

impl AppState {
    /// Configured instrument for `symbol` (case-insensitive), or a bare
    /// crypto instrument when none is configured.
    pub fn resolve_instrument(&self, symbol: &str) -> Instrument {
        self.app_config
            .find_instrument(symbol)
            .unwrap_or_else(|| Instrument::new(symbol, AssetClass::Crypto))
    }
}

pub fn init_tracing() {
    let log_format =
        std::env::var("PRICEMONITOR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Load configuration files and open the quote store.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let app_config = load_app_config(&config.config_dir)?;
    tracing::info!(
        "Configuration loaded from {}: {} providers, {} instruments, {} schedules",
        config.config_dir.display(),
        app_config.providers.len(),
        app_config.instruments.len(),
        app_config.schedules.len()
    );

    let store: Arc<dyn QuoteStore> = Arc::new(CsvQuoteStore::new(&app_config.storage.root)?);

    Ok(Arc::new(AppState { store, app_config }))
}

/// Build the runner and its poll tasks. The environment's duration bound
/// wins over the one in schedules.yaml.
pub fn build_runner(config: &Config, state: &AppState) -> anyhow::Result<(Runner, Vec<PollTask>)> {
    let tasks = build_tasks(&state.app_config)?;

    let mut runner_config = state.app_config.run.runner_config()?;
    if config.max_duration_secs.is_some() {
        runner_config = runner_config.with_max_duration_secs(config.max_duration_secs);
    }

    Ok((Runner::new(Arc::clone(&state.store), runner_config), tasks))
}
