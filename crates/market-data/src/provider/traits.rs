//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{Instrument, Quote};

use super::capabilities::ProviderCapabilities;

/// Trait for quote providers.
///
/// Implement this trait to add a new price source. Providers do not retry
/// and have no notion of scheduling; the caller owns both.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricemonitor_market_data::provider::{ProviderCapabilities, QuoteProvider};
///
/// struct MyProvider {
///     name: String,
/// }
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::default()
///     }
///
///     async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, ProviderError> {
///         // ... call the upstream API
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Configured name of this provider instance.
    ///
    /// Recorded on every quote and used in log lines.
    fn name(&self) -> &str;

    /// Describes what this provider can do.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch the current quote for one instrument.
    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, ProviderError>;

    /// Fetch current quotes for several instruments.
    ///
    /// The default implementation calls [`fetch_quote`](Self::fetch_quote)
    /// sequentially and stops at the first failure. Providers with a batch
    /// endpoint override it. Callers must not assume the batch is atomic.
    async fn fetch_quotes(&self, instruments: &[Instrument]) -> Result<Vec<Quote>, ProviderError> {
        let mut quotes = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            quotes.push(self.fetch_quote(instrument).await?);
        }
        Ok(quotes)
    }
}
