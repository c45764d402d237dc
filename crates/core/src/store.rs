//! Quote storage trait.
//!
//! The storage engine is an append-only log per instrument. This trait
//! abstracts the persistence layer so that the scheduler can be exercised
//! against an in-memory store in tests.
//!
//! # Log selection
//!
//! Every operation selects its log by [`log_key`] of the instrument symbol.
//! Quotes for the same symbol from different providers share one log.

use async_trait::async_trait;

use pricemonitor_market_data::{Instrument, Quote};

use crate::errors::StorageError;

/// Storage interface for quote history.
///
/// # Method Naming Convention
///
/// - `append*` - Add records; never rewrite existing ones
/// - `latest` - Most recent record
/// - `history` - Records oldest to newest
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Appends one quote to the log of its instrument.
    ///
    /// Creates the log on first write. A failure leaves earlier records intact.
    async fn append(&self, quote: &Quote) -> Result<(), StorageError>;

    /// Appends quotes in order. Not atomic: a failure part way through
    /// leaves the already appended records in place.
    async fn append_batch(&self, quotes: &[Quote]) -> Result<(), StorageError> {
        for quote in quotes {
            self.append(quote).await?;
        }
        Ok(())
    }

    /// Returns the last record of the instrument's log, or `None` when the
    /// log is empty or absent.
    async fn latest(&self, instrument: &Instrument) -> Result<Option<Quote>, StorageError>;

    /// Returns records oldest to newest.
    ///
    /// With `limit`, only the most recent `limit` records are returned, still
    /// oldest first. `Some(0)` yields an empty vector.
    async fn history(
        &self,
        instrument: &Instrument,
        limit: Option<usize>,
    ) -> Result<Vec<Quote>, StorageError>;
}

/// Log key for a symbol: lowercase, with `/` and `\` replaced by `-`.
///
/// ```
/// use pricemonitor_core::store::log_key;
///
/// assert_eq!(log_key("BTC/USD"), "btc-usd");
/// assert_eq!(log_key("XAU"), "xau");
/// ```
pub fn log_key(symbol: &str) -> String {
    symbol
        .to_lowercase()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}
