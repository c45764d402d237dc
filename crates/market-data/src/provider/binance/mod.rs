//! Binance spot price provider.
//!
//! Uses the public `GET /api/v3/ticker/price` endpoint, which needs no API
//! key. A single call returns the last traded price for one pair, or for a
//! list of pairs when `symbols` is given.
//!
//! Note: the endpoint carries no timestamp, so quotes are stamped with the
//! local receive time.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::errors::{ProviderError, RegistryError};
use crate::models::{Instrument, Quote};
use crate::provider::http::{build_client, classify_status, get_raw, malformed, parse_price};
use crate::provider::{ProviderCapabilities, QuoteProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_QUOTE: &str = "USDT";

/// Binance error code for an unknown trading pair
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Ticker price entry
#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Error payload returned with 4xx statuses
#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    msg: String,
}

/// Binance spot price provider.
///
/// # Example
///
/// ```ignore
/// use pricemonitor_market_data::provider::binance::BinanceProvider;
///
/// let provider = BinanceProvider::new("binance")?.with_default_quote("USDC");
/// ```
pub struct BinanceProvider {
    name: String,
    client: Client,
    base_url: String,
    default_quote: String,
}

impl BinanceProvider {
    pub fn new(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        Ok(Self {
            client: build_client(&name)?,
            name,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_quote: DEFAULT_QUOTE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_quote(mut self, quote: impl Into<String>) -> Self {
        self.default_quote = quote.into().to_uppercase();
        self
    }

    /// Binance pair for an instrument, e.g. `BTCUSDT`.
    pub(crate) fn resolve_pair(instrument: &Instrument) -> String {
        match (instrument.base.as_deref(), instrument.quote.as_deref()) {
            (Some(base), Some(quote)) if !base.is_empty() && !quote.is_empty() => {
                format!("{}{}", base, quote).to_uppercase()
            }
            _ => instrument
                .symbol
                .chars()
                .filter(|c| !matches!(c, '/' | '-' | '_'))
                .collect::<String>()
                .to_uppercase(),
        }
    }

    fn currency_for(&self, instrument: &Instrument) -> String {
        instrument
            .quote
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| self.default_quote.clone())
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.base_url)
    }

    /// Turn a non-success response into an error, recognising Binance's
    /// "invalid symbol" payload.
    fn response_error(&self, status: StatusCode, body: &str, pairs: &str) -> Option<ProviderError> {
        if status == StatusCode::BAD_REQUEST {
            if let Ok(err) = serde_json::from_str::<BinanceErrorBody>(body) {
                if err.code == INVALID_SYMBOL_CODE {
                    return Some(ProviderError::SymbolNotFound {
                        provider: self.name.clone(),
                        symbol: pairs.to_string(),
                    });
                }
                return Some(ProviderError::Transport {
                    provider: self.name.clone(),
                    message: format!("Binance error {}: {}", err.code, err.msg),
                });
            }
        }
        classify_status(&self.name, status, body)
    }

    fn build_quote(&self, instrument: &Instrument, ticker: &TickerPrice) -> Result<Quote, ProviderError> {
        let price = parse_price(&self.name, &ticker.price)?;
        let quote = Quote::new(
            instrument.clone(),
            price,
            Utc::now(),
            self.currency_for(instrument),
            self.name.clone(),
        )
        .with_extra("pair", serde_json::Value::String(ticker.symbol.clone()));
        Ok(quote)
    }
}

#[async_trait]
impl QuoteProvider for BinanceProvider {
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
        let pair = Self::resolve_pair(instrument);
        let (status, body) =
            get_raw(&self.client, &self.name, &self.ticker_url(), &[("symbol", pair.as_str())]).await?;

        if let Some(error) = self.response_error(status, &body, &pair) {
            return Err(error);
        }

        let ticker: TickerPrice =
            serde_json::from_str(&body).map_err(|e| malformed(&self.name, e))?;
        self.build_quote(instrument, &ticker)
    }

    async fn fetch_quotes(&self, instruments: &[Instrument]) -> Result<Vec<Quote>, ProviderError> {
        if instruments.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<String> = instruments.iter().map(Self::resolve_pair).collect();
        let encoded = serde_json::to_string(&pairs).map_err(|e| malformed(&self.name, e))?;
        let (status, body) =
            get_raw(&self.client, &self.name, &self.ticker_url(), &[("symbols", encoded.as_str())]).await?;

        if let Some(error) = self.response_error(status, &body, &pairs.join(",")) {
            return Err(error);
        }

        let tickers: Vec<TickerPrice> =
            serde_json::from_str(&body).map_err(|e| malformed(&self.name, e))?;
        let by_pair: HashMap<&str, &TickerPrice> =
            tickers.iter().map(|t| (t.symbol.as_str(), t)).collect();

        instruments
            .iter()
            .zip(pairs.iter())
            .map(|(instrument, pair)| {
                let ticker = by_pair.get(pair.as_str()).ok_or_else(|| {
                    ProviderError::SymbolNotFound {
                        provider: self.name.clone(),
                        symbol: pair.clone(),
                    }
                })?;
                self.build_quote(instrument, ticker)
            })
            .collect()
    }
}
