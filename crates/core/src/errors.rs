//! Core error types for the price monitor.
//!
//! - [`ConfigError`]: fatal at startup, aborts the process
//! - [`StorageError`]: returned by a single storage call, never retried by the core

use std::path::PathBuf;

use thiserror::Error;

use pricemonitor_market_data::RegistryError;

/// Errors raised while loading configuration and building poll tasks.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Unknown provider kind '{kind}' for provider '{provider}'")]
    UnknownProviderKind { provider: String, kind: String },

    #[error("Failed to build provider: {0}")]
    Provider(#[from] RegistryError),

    #[error("Schedule references unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("No instrument '{symbol}' configured for provider '{provider}'")]
    MissingInstrument { symbol: String, provider: String },

    #[error("Invalid polling interval {interval} for {symbol}: must be a positive number of seconds")]
    InvalidInterval { symbol: String, interval: f64 },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("No poll tasks configured")]
    NoTasks,
}

/// Errors returned by [`QuoteStore`](crate::store::QuoteStore) operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(String),

    #[error("Unexpected header in {path}: found '{found}'")]
    SchemaMismatch { path: PathBuf, found: String },

    #[error("Storage task failed: {0}")]
    Join(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
