//! CSV storage implementation for the price monitor.
//!
//! Implements the [`QuoteStore`](pricemonitor_core::QuoteStore) trait from
//! `pricemonitor-core` as one append-only CSV file per instrument symbol.
//!
//! ```text
//! core (scheduler)        server (facade)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-csv (this crate)
//!                  │
//!                  ▼
//!         <root>/<symbol>.csv
//! ```

mod record;
mod store;

pub use record::{HEADER, PRICE_SCALE};
pub use store::CsvQuoteStore;
