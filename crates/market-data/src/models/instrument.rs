use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Asset classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Crypto,
    Metal,
    Equity,
    Fx,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Metal => "metal",
            Self::Equity => "equity",
            Self::Fx => "fx",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crypto" => Ok(Self::Crypto),
            "metal" => Ok(Self::Metal),
            "equity" => Ok(Self::Equity),
            "fx" => Ok(Self::Fx),
            other => Err(format!("unknown asset class '{}'", other)),
        }
    }
}

/// Identity of a tradable asset.
///
/// `symbol` is the provider-facing symbol. The optional fields are descriptive
/// and only `base`/`quote` influence behavior (through [`Instrument::display_symbol`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub asset_class: AssetClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instrument {
    /// Create an instrument with only a symbol and asset class.
    pub fn new(symbol: impl Into<String>, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            exchange: None,
            base: None,
            quote: None,
            name: None,
        }
    }

    /// Set the base/quote currency pair.
    pub fn with_pair(mut self, base: impl Into<String>, quote: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self.quote = Some(quote.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `BASE/QUOTE` when both legs are known, otherwise the raw symbol.
    pub fn display_symbol(&self) -> String {
        match (self.base.as_deref(), self.quote.as_deref()) {
            (Some(base), Some(quote)) if !base.is_empty() && !quote.is_empty() => {
                format!("{}/{}", base, quote)
            }
            _ => self.symbol.clone(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_symbol(), self.asset_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_symbol_uses_pair() {
        let btc = Instrument::new("BTCUSDT", AssetClass::Crypto).with_pair("BTC", "USDT");
        assert_eq!(btc.display_symbol(), "BTC/USDT");
    }

    #[test]
    fn test_display_symbol_falls_back_to_symbol() {
        let gold = Instrument::new("XAU", AssetClass::Metal);
        assert_eq!(gold.display_symbol(), "XAU");

        let half = Instrument {
            base: Some("EUR".to_string()),
            ..Instrument::new("EURUSD", AssetClass::Fx)
        };
        assert_eq!(half.display_symbol(), "EURUSD");
    }

    #[test]
    fn test_instruments_are_value_equal() {
        let a = Instrument::new("AAPL", AssetClass::Equity).with_exchange("XNAS");
        let b = Instrument::new("AAPL", AssetClass::Equity).with_exchange("XNAS");
        let c = Instrument::new("AAPL", AssetClass::Equity);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_asset_class_from_str() {
        assert_eq!("crypto".parse::<AssetClass>(), Ok(AssetClass::Crypto));
        assert_eq!(" Metal ".parse::<AssetClass>(), Ok(AssetClass::Metal));
        assert_eq!("fx".parse::<AssetClass>(), Ok(AssetClass::Fx));
        assert!("bond".parse::<AssetClass>().is_err());
    }

    #[test]
    fn test_asset_class_serde_is_lowercase() {
        let json = serde_json::to_string(&AssetClass::Equity).unwrap();
        assert_eq!(json, "\"equity\"");
        let parsed: AssetClass = serde_json::from_str("\"metal\"").unwrap();
        assert_eq!(parsed, AssetClass::Metal);
    }
}
