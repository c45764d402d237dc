use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pricemonitor_market_data::{Instrument, QuoteProvider};

use crate::errors::ConfigError;

/// One polling loop: an instrument, the provider that prices it, and how
/// often to ask.
#[derive(Clone)]
pub struct PollTask {
    instrument: Instrument,
    provider: Arc<dyn QuoteProvider>,
    interval: Duration,
}

impl PollTask {
    /// Create a task polling every `interval_seconds`.
    ///
    /// Fails with [`ConfigError::InvalidInterval`] unless the interval is a
    /// finite number greater than zero.
    pub fn new(
        instrument: Instrument,
        provider: Arc<dyn QuoteProvider>,
        interval_seconds: f64,
    ) -> Result<Self, ConfigError> {
        if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
            return Err(ConfigError::InvalidInterval {
                symbol: instrument.symbol.clone(),
                interval: interval_seconds,
            });
        }

        let interval = Duration::try_from_secs_f64(interval_seconds).map_err(|_| {
            ConfigError::InvalidInterval {
                symbol: instrument.symbol.clone(),
                interval: interval_seconds,
            }
        })?;

        Ok(Self {
            instrument,
            provider,
            interval,
        })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn provider(&self) -> &Arc<dyn QuoteProvider> {
        &self.provider
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Debug for PollTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollTask")
            .field("instrument", &self.instrument.symbol)
            .field("provider", &self.provider.name())
            .field("interval", &self.interval)
            .finish()
    }
}
