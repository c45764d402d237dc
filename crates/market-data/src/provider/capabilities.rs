//! Provider capability flags.

/// Describes what a quote provider can do.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProviderCapabilities {
    /// Whether the provider serves current prices.
    pub supports_realtime: bool,

    /// Whether the provider serves historical prices.
    pub supports_historical: bool,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            supports_realtime: true,
            supports_historical: false,
        }
    }
}
