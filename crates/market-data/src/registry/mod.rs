//! Provider registry.
//!
//! A closed mapping from the `kind` named in configuration to a concrete
//! [`QuoteProvider`] implementation. Each configured provider is built once
//! and shared by every poll task that references it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::errors::RegistryError;
use crate::provider::binance::BinanceProvider;
use crate::provider::coinbase::CoinbaseProvider;
use crate::provider::metal_price_api::MetalPriceApiProvider;
use crate::provider::QuoteProvider;

/// Free-form provider settings as read from configuration.
pub type ProviderSettings = HashMap<String, serde_json::Value>;

/// Known provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Binance,
    Coinbase,
    MetalPriceApi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Binance, Self::Coinbase, Self::MetalPriceApi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Coinbase => "coinbase",
            Self::MetalPriceApi => "metal_price_api",
        }
    }

    /// Construct a provider of this kind.
    ///
    /// `name` is the configured provider name; it is what the provider
    /// reports from [`QuoteProvider::name`] and what ends up in stored
    /// records.
    pub fn build(
        &self,
        name: &str,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn QuoteProvider>, RegistryError> {
        debug!("Building provider '{}' of kind {}", name, self);

        let provider: Arc<dyn QuoteProvider> = match self {
            Self::Binance => {
                let mut provider = BinanceProvider::new(name)?;
                if let Some(url) = optional_str(name, settings, "base_url")? {
                    provider = provider.with_base_url(url);
                }
                if let Some(quote) = optional_str(name, settings, "default_quote")? {
                    provider = provider.with_default_quote(quote);
                }
                Arc::new(provider)
            }
            Self::Coinbase => {
                let mut provider = CoinbaseProvider::new(name)?;
                if let Some(url) = optional_str(name, settings, "base_url")? {
                    provider = provider.with_base_url(url);
                }
                Arc::new(provider)
            }
            Self::MetalPriceApi => {
                let api_key = optional_str(name, settings, "api_key")?
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| RegistryError::MissingSetting {
                        provider: name.to_string(),
                        setting: "api_key".to_string(),
                    })?;
                let mut provider = MetalPriceApiProvider::new(name, api_key)?;
                if let Some(url) = optional_str(name, settings, "base_url")? {
                    provider = provider.with_base_url(url);
                }
                Arc::new(provider)
            }
        };

        Ok(provider)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "coinbase" => Ok(Self::Coinbase),
            "metal_price_api" | "metalpriceapi" => Ok(Self::MetalPriceApi),
            other => Err(RegistryError::UnknownKind(other.to_string())),
        }
    }
}

/// Read an optional string setting. Present-but-not-a-string is an error.
fn optional_str<'a>(
    provider: &str,
    settings: &'a ProviderSettings,
    key: &str,
) -> Result<Option<&'a str>, RegistryError> {
    match settings.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(RegistryError::InvalidSetting {
            provider: provider.to_string(),
            setting: key.to_string(),
            message: format!("expected a string, got {}", other),
        }),
    }
}
