//! Price Monitor Core
//!
//! The polling scheduler, the quote store contract and configuration.
//!
//! # Modules
//!
//! - [`store`] - `QuoteStore` trait and log keys
//! - [`scheduler`] - Poll tasks, backoff and the runner
//! - [`config`] - YAML configuration and task construction
//! - [`errors`] - `ConfigError` and `StorageError`

pub mod config;
pub mod errors;
pub mod scheduler;
pub mod store;

pub use errors::{ConfigError, StorageError};
pub use scheduler::{
    BackoffConfig, PollTask, RetryPolicy, RunReport, Runner, RunnerConfig, TaskReport,
};
pub use store::{log_key, QuoteStore};

// Re-export the market data crate for consumers
pub use pricemonitor_market_data as market_data;
