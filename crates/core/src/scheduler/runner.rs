//! Scheduler runner.
//!
//! One tokio task per [`PollTask`]. Each loop fetches, persists and sleeps
//! until the shared cancellation token fires. A failure in one loop never
//! reaches another.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use pricemonitor_market_data::{ProviderError, Quote};

use super::backoff::BackoffConfig;
use super::task::PollTask;
use crate::store::QuoteStore;

/// Lower bound of the fixed retry delay.
const MIN_FIXED_RETRY: Duration = Duration::from_secs(1);

/// How long a loop waits after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RetryPolicy {
    /// Retry after `max(1s, interval)`.
    #[default]
    Fixed,
    /// Retry after a jittered exponential delay keyed on consecutive failures.
    Exponential(BackoffConfig),
}

impl RetryPolicy {
    /// Delay before the next poll. `attempt` is zero for the first failure
    /// after a success.
    pub fn delay(&self, interval: Duration, attempt: u32) -> Duration {
        match self {
            Self::Fixed => interval.max(MIN_FIXED_RETRY),
            Self::Exponential(backoff) => backoff.delay(attempt),
        }
    }
}

/// Runner settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerConfig {
    /// Stop all loops after this long. `None` runs until shutdown.
    pub max_duration: Option<Duration>,
    pub retry: RetryPolicy,
}

impl RunnerConfig {
    /// Set the run bound from seconds; absent, non-positive or non-finite
    /// values mean unbounded.
    pub fn with_max_duration_secs(mut self, seconds: Option<f64>) -> Self {
        self.max_duration = seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Counters for one polling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub symbol: String,
    pub provider: String,
    /// Fetch attempts, successful or not
    pub polls: u64,
    /// Quotes appended to storage
    pub stored: u64,
    pub provider_failures: u64,
    pub storage_failures: u64,
}

impl TaskReport {
    fn for_task(task: &PollTask) -> Self {
        Self {
            symbol: task.instrument().symbol.clone(),
            provider: task.provider_name().to_string(),
            ..Default::default()
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// One entry per loop that exited normally, sorted by symbol then provider
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn task(&self, symbol: &str, provider: &str) -> Option<&TaskReport> {
        self.tasks
            .iter()
            .find(|t| t.symbol == symbol && t.provider == provider)
    }

    pub fn total_stored(&self) -> u64 {
        self.tasks.iter().map(|t| t.stored).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.tasks
            .iter()
            .map(|t| t.provider_failures + t.storage_failures)
            .sum()
    }
}

/// Drives poll loops against a shared store.
pub struct Runner {
    store: Arc<dyn QuoteStore>,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(store: Arc<dyn QuoteStore>, config: RunnerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every task until `shutdown` is cancelled or the configured
    /// duration elapses, then wait for all loops to exit.
    ///
    /// An empty task set returns an empty report immediately.
    pub async fn run(&self, tasks: Vec<PollTask>, shutdown: CancellationToken) -> RunReport {
        if tasks.is_empty() {
            info!("No poll tasks to run");
            return RunReport::default();
        }

        info!(
            "Starting {} poll tasks (max duration: {:?}, retry: {:?})",
            tasks.len(),
            self.config.max_duration,
            self.config.retry
        );

        let token = shutdown.child_token();
        let mut loops = JoinSet::new();
        for task in tasks {
            loops.spawn(poll_loop(
                task,
                Arc::clone(&self.store),
                self.config.retry,
                token.clone(),
            ));
        }

        match self.config.max_duration {
            Some(limit) => {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => info!("Run duration of {:?} elapsed", limit),
                    _ = shutdown.cancelled() => info!("Shutdown requested"),
                }
            }
            None => {
                shutdown.cancelled().await;
                info!("Shutdown requested");
            }
        }
        token.cancel();

        let mut reports = Vec::new();
        while let Some(joined) = loops.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!("Poll task terminated abnormally: {}", e),
            }
        }
        reports.sort_by(|a, b| (&a.symbol, &a.provider).cmp(&(&b.symbol, &b.provider)));

        let report = RunReport { tasks: reports };
        info!(
            "Run finished: {} loops, {} quotes stored, {} failures",
            report.tasks.len(),
            report.total_stored(),
            report.total_failures()
        );
        report
    }
}

/// Fetch, persist, sleep; repeat until cancelled.
async fn poll_loop(
    task: PollTask,
    store: Arc<dyn QuoteStore>,
    retry: RetryPolicy,
    token: CancellationToken,
) -> TaskReport {
    let mut report = TaskReport::for_task(&task);
    let mut consecutive_failures: u32 = 0;
    let mut last_timestamp: Option<DateTime<Utc>> = None;

    debug!(
        "Polling {} via {} every {:?}",
        task.instrument(),
        task.provider_name(),
        task.interval()
    );

    loop {
        report.polls += 1;

        let fetched = fetch_guarded(&task)
            .await
            .and_then(|quote| accept(&task, quote, last_timestamp));

        let delay = match fetched {
            Ok(quote) => {
                consecutive_failures = 0;
                last_timestamp = Some(quote.timestamp);

                match store.append(&quote).await {
                    Ok(()) => {
                        report.stored += 1;
                        debug!(
                            "Stored {} {} {} from {}",
                            quote.instrument.display_symbol(),
                            quote.price,
                            quote.currency,
                            quote.provider
                        );
                    }
                    Err(e) => {
                        report.storage_failures += 1;
                        error!("Failed to store quote {:?}: {}", quote, e);
                    }
                }
                task.interval()
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                report.provider_failures += 1;
                let delay = retry.delay(task.interval(), consecutive_failures - 1);
                warn!(
                    "Fetch failed: provider={} symbol={} kind={} attempt={} retry_in={:?}: {}",
                    task.provider_name(),
                    task.instrument().symbol,
                    e.kind(),
                    consecutive_failures,
                    delay,
                    e
                );
                delay
            }
        };

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!(
        "Stopped polling {} via {}",
        task.instrument(),
        task.provider_name()
    );
    report
}

/// Call the provider, turning a panic into [`ProviderError::Unexpected`].
async fn fetch_guarded(task: &PollTask) -> Result<Quote, ProviderError> {
    let fetch = task.provider().fetch_quote(task.instrument());
    match AssertUnwindSafe(fetch).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                "Provider {} panicked while fetching {}: {}",
                task.provider_name(),
                task.instrument().symbol,
                message
            );
            Err(ProviderError::Unexpected {
                provider: task.provider_name().to_string(),
                message: format!("panic: {}", message),
            })
        }
    }
}

/// Validate a fetched quote and keep the task's stream non-decreasing in time.
fn accept(
    task: &PollTask,
    quote: Quote,
    last_timestamp: Option<DateTime<Utc>>,
) -> Result<Quote, ProviderError> {
    quote.validate()?;

    if let Some(last) = last_timestamp {
        if quote.timestamp < last {
            return Err(ProviderError::ValidationFailed {
                provider: task.provider_name().to_string(),
                message: format!(
                    "timestamp {} is older than previous quote at {}",
                    quote.timestamp.to_rfc3339(),
                    last.to_rfc3339()
                ),
            });
        }
    }

    Ok(quote)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
