//! Price Monitor Market Data Crate
//!
//! Instrument and quote models, the provider abstraction, and the concrete
//! provider adapters used by the price monitor.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |   Instrument     | --> |  QuoteProvider   | --> |      Quote       |
//! +------------------+     +------------------+     +------------------+
//!                                  ^
//!                                  |
//!                          +------------------+
//!                          |  ProviderKind    |  (closed registry)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Instrument`] - What is being priced
//! - [`Quote`] - A single price observation
//! - [`QuoteProvider`] - Source of quotes
//! - [`ProviderError`] - Classified provider failure
//! - [`ProviderKind`] - Builds providers from configuration

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use errors::{ProviderError, ProviderErrorKind, RegistryError};
pub use models::{AssetClass, Instrument, Quote};
pub use provider::binance::BinanceProvider;
pub use provider::coinbase::CoinbaseProvider;
pub use provider::metal_price_api::MetalPriceApiProvider;
pub use provider::{ProviderCapabilities, QuoteProvider};
pub use registry::{ProviderKind, ProviderSettings};
