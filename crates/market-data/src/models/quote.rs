use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::instrument::Instrument;
use crate::errors::ProviderError;

/// A single timestamped price observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument this observation describes
    pub instrument: Instrument,

    /// Observed price, strictly positive for a valid quote
    pub price: Decimal,

    /// Observation time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Price currency
    pub currency: String,

    /// Name of the provider that produced the quote
    pub provider: String,

    /// Provider-specific metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Quote {
    /// Create a new quote with no extra metadata
    pub fn new(
        instrument: Instrument,
        price: Decimal,
        timestamp: DateTime<Utc>,
        currency: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            instrument,
            price,
            timestamp,
            currency: currency.into(),
            provider: provider.into(),
            extra: HashMap::new(),
        }
    }

    /// Attach a provider-specific metadata entry
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Check that this quote is a usable observation.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.price <= Decimal::ZERO {
            return Err(self.invalid(format!(
                "non-positive price {} for {}",
                self.price, self.instrument.symbol
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(self.invalid(format!("missing currency for {}", self.instrument.symbol)));
        }
        if self.provider.trim().is_empty() {
            return Err(self.invalid(format!("missing provider for {}", self.instrument.symbol)));
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> ProviderError {
        ProviderError::ValidationFailed {
            provider: self.provider.clone(),
            message,
        }
    }
}
