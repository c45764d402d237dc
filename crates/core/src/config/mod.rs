//! YAML configuration.
//!
//! - `models` - File and settings models
//! - `loader` - Loading plus provider, instrument and task construction

mod loader;
mod models;

pub use loader::{
    build_instruments, build_providers, build_tasks, load_app_config, SCHEDULES_FILE,
    SOURCES_FILE, STORAGE_FILE,
};
pub use models::{
    AppConfig, InstrumentConfig, ProviderConfig, RetryPolicyKind, RetrySettings, RunSettings,
    ScheduleConfig, StorageSettings, CSV_BACKEND,
};
