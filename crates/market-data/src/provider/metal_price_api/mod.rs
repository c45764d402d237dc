//! Metal Price API provider for precious metals.
//!
//! Supported metals:
//! - XAU (Gold)
//! - XAG (Silver)
//! - XPT (Platinum)
//! - XPD (Palladium)
//! - XRH (Rhodium)
//! - XRU (Ruthenium)
//! - XIR (Iridium)
//! - XOS (Osmium)
//!
//! The API quotes `1 base_currency = rate troy ounces`, so the price per
//! ounce is `1 / rate`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::{ProviderError, RegistryError};
use crate::models::{Instrument, Quote};
use crate::provider::http::{build_client, get_text, malformed};
use crate::provider::{ProviderCapabilities, QuoteProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.metalpriceapi.com";

/// Supported metal symbols
const SUPPORTED_METALS: &[&str] = &["XAU", "XAG", "XPT", "XPD", "XRH", "XRU", "XIR", "XOS"];

/// Quote currency used when the instrument does not name one.
const DEFAULT_QUOTE: &str = "USD";

/// API response from Metal Price API
#[derive(Debug, Deserialize)]
struct MetalPriceResponse {
    success: bool,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    rates: HashMap<String, f64>,
    #[serde(default)]
    error: Option<MetalPriceError>,
}

#[derive(Debug, Deserialize)]
struct MetalPriceError {
    #[serde(default)]
    statuscode: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

/// Metal Price API provider.
pub struct MetalPriceApiProvider {
    name: String,
    client: Client,
    api_key: String,
    base_url: String,
}

impl MetalPriceApiProvider {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        Ok(Self {
            client: build_client(&name)?,
            name,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Check if the given symbol is a supported metal.
    fn is_supported_metal(symbol: &str) -> bool {
        SUPPORTED_METALS.contains(&symbol)
    }

    /// `(metal, currency)` for an instrument.
    fn resolve(instrument: &Instrument) -> (String, String) {
        let metal = instrument
            .base
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(&instrument.symbol)
            .to_uppercase();
        let currency = instrument
            .quote
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUOTE)
            .to_uppercase();
        (metal, currency)
    }

    fn parse_latest(
        &self,
        instrument: &Instrument,
        metal: &str,
        currency: &str,
        body: &str,
    ) -> Result<Quote, ProviderError> {
        let response: MetalPriceResponse =
            serde_json::from_str(body).map_err(|e| malformed(&self.name, e))?;

        if !response.success {
            let (code, message) = response
                .error
                .map(|e| (e.statuscode, e.message.unwrap_or_default()))
                .unwrap_or((None, "API request failed".to_string()));
            return Err(match code {
                Some(401) | Some(403) => ProviderError::Authentication {
                    provider: self.name.clone(),
                    message,
                },
                Some(429) => ProviderError::RateLimited {
                    provider: self.name.clone(),
                },
                _ => ProviderError::Transport {
                    provider: self.name.clone(),
                    message,
                },
            });
        }

        let rate = response
            .rates
            .get(metal)
            .ok_or_else(|| ProviderError::SymbolNotFound {
                provider: self.name.clone(),
                symbol: metal.to_string(),
            })?;

        if !rate.is_finite() || *rate <= 0.0 {
            return Err(ProviderError::ValidationFailed {
                provider: self.name.clone(),
                message: format!("invalid rate {} for {}", rate, metal),
            });
        }

        let price = Decimal::try_from(1.0 / rate).map_err(|_| ProviderError::ValidationFailed {
            provider: self.name.clone(),
            message: "failed to convert rate to decimal".to_string(),
        })?;

        let timestamp = response
            .timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(Quote::new(
            instrument.clone(),
            price,
            timestamp,
            currency,
            self.name.clone(),
        ))
    }
}

#[async_trait]
impl QuoteProvider for MetalPriceApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_realtime: true,
            supports_historical: false,
        }
    }

    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, ProviderError> {
        let (metal, currency) = Self::resolve(instrument);

        if !Self::is_supported_metal(&metal) {
            return Err(ProviderError::SymbolNotFound {
                provider: self.name.clone(),
                symbol: metal,
            });
        }

        let url = format!("{}/v1/latest", self.base_url);
        let body = get_text(
            &self.client,
            &self.name,
            &url,
            &[
                ("api_key", self.api_key.as_str()),
                ("base", currency.as_str()),
                ("currencies", metal.as_str()),
            ],
        )
        .await?;

        self.parse_latest(instrument, &metal, &currency, &body)
    }
}
