//! Market data models
//!
//! - `instrument` - Instrument identity and the AssetClass enum
//! - `quote` - Quote observations

mod instrument;
mod quote;

pub use instrument::{AssetClass, Instrument};
pub use quote::Quote;
