//! Polling scheduler.
//!
//! - `backoff` - Jittered exponential delay
//! - `task` - PollTask value type
//! - `runner` - Concurrent poll loops with failure isolation

mod backoff;
mod runner;
mod task;

pub use backoff::{exponential_backoff, BackoffConfig};
pub use runner::{RetryPolicy, RunReport, Runner, RunnerConfig, TaskReport};
pub use task::PollTask;
