//! Coinbase spot price provider.
//!
//! Uses the public `GET /v2/prices/{BASE}-{QUOTE}/spot` endpoint. It covers
//! crypto pairs and a handful of fiat crosses. No API key is required.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::errors::{ProviderError, RegistryError};
use crate::models::{Instrument, Quote};
use crate::provider::http::{build_client, classify_status, get_raw, malformed, parse_price};
use crate::provider::{ProviderCapabilities, QuoteProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.coinbase.com";

/// Quote currency used when the instrument does not name one.
const DEFAULT_QUOTE: &str = "USD";

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotPrice,
}

#[derive(Debug, Deserialize)]
struct SpotPrice {
    amount: String,
    base: String,
    currency: String,
}

/// Coinbase spot price provider.
pub struct CoinbaseProvider {
    name: String,
    client: Client,
    base_url: String,
}

impl CoinbaseProvider {
    pub fn new(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        Ok(Self {
            client: build_client(&name)?,
            name,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `(BASE, QUOTE)` for an instrument.
    ///
    /// Explicit `base`/`quote` fields win. Otherwise the symbol is split on
    /// `/` or `-`; a bare symbol is priced in USD.
    pub(crate) fn resolve_pair(instrument: &Instrument) -> (String, String) {
        if let (Some(base), Some(quote)) = (instrument.base.as_deref(), instrument.quote.as_deref()) {
            if !base.is_empty() && !quote.is_empty() {
                return (base.to_uppercase(), quote.to_uppercase());
            }
        }

        let symbol = instrument.symbol.trim();
        match symbol.split_once(|c: char| c == '/' || c == '-') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                (base.to_uppercase(), quote.to_uppercase())
            }
            _ => (symbol.to_uppercase(), DEFAULT_QUOTE.to_string()),
        }
    }

    fn spot_url(&self, base: &str, quote: &str) -> String {
        format!("{}/v2/prices/{}-{}/spot", self.base_url, base, quote)
    }

    fn parse_spot(&self, instrument: &Instrument, body: &str) -> Result<Quote, ProviderError> {
        let response: SpotResponse =
            serde_json::from_str(body).map_err(|e| malformed(&self.name, e))?;
        let price = parse_price(&self.name, &response.data.amount)?;

        Ok(Quote::new(
            instrument.clone(),
            price,
            Utc::now(),
            response.data.currency.to_uppercase(),
            self.name.clone(),
        )
        .with_extra("base", serde_json::Value::String(response.data.base)))
    }
}

#[async_trait]
impl QuoteProvider for CoinbaseProvider {
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
        let (base, quote) = Self::resolve_pair(instrument);
        let url = self.spot_url(&base, &quote);
        let (status, body) = get_raw(&self.client, &self.name, &url, &[]).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                provider: self.name.clone(),
                symbol: format!("{}-{}", base, quote),
            });
        }
        if let Some(error) = classify_status(&self.name, status, &body) {
            return Err(error);
        }

        self.parse_spot(instrument, &body)
    }
}
