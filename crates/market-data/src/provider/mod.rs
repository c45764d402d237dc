//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all providers implement
//! - Provider capability flags
//! - Concrete provider implementations (Binance, Coinbase, Metal Price API)
//!
//! Providers are deliberately thin: one request, one classified result.
//! Scheduling, retries and persistence live in `pricemonitor-core`.

mod capabilities;
mod http;
mod traits;

pub mod binance;
pub mod coinbase;
pub mod metal_price_api;

// Re-exports
pub use capabilities::ProviderCapabilities;
pub use traits::QuoteProvider;
