//! Error types for the market data crate.
//!
//! - [`ProviderError`]: classified failure of a single provider call
//! - [`ProviderErrorKind`]: coarse classification used for logging
//! - [`RegistryError`]: failure to construct a provider from its settings

mod kind;

pub use kind::ProviderErrorKind;

use thiserror::Error;

/// Errors returned by [`QuoteProvider`](crate::provider::QuoteProvider) calls.
///
/// Every variant carries the provider name so that a log line built from the
/// error alone is enough to tell which source failed.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be delivered or the provider answered with a
    /// non-success status.
    #[error("Transport error: {provider} - {message}")]
    Transport { provider: String, message: String },

    /// The transport timeout elapsed before a response arrived.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Credentials are missing or were rejected.
    #[error("Authentication failed: {provider} - {message}")]
    Authentication { provider: String, message: String },

    /// The provider throttled the request (HTTP 429/418).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The provider does not know the requested symbol.
    #[error("Symbol not found: {provider} - {symbol}")]
    SymbolNotFound { provider: String, symbol: String },

    /// The response body could not be parsed.
    #[error("Malformed response: {provider} - {message}")]
    MalformedResponse { provider: String, message: String },

    /// The response parsed but does not describe a usable quote.
    #[error("Validation failed: {provider} - {message}")]
    ValidationFailed { provider: String, message: String },

    /// Anything else, including panics caught around a provider call.
    #[error("Unexpected failure: {provider} - {message}")]
    Unexpected { provider: String, message: String },
}

impl ProviderError {
    /// Returns the classification for this error.
    ///
    /// ```
    /// use pricemonitor_market_data::errors::{ProviderError, ProviderErrorKind};
    ///
    /// let error = ProviderError::RateLimited { provider: "binance".to_string() };
    /// assert_eq!(error.kind(), ProviderErrorKind::RateLimit);
    /// ```
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Transport { .. } => ProviderErrorKind::Transport,
            Self::Timeout { .. } => ProviderErrorKind::Timeout,
            Self::Authentication { .. } => ProviderErrorKind::Authentication,
            Self::RateLimited { .. } => ProviderErrorKind::RateLimit,
            Self::SymbolNotFound { .. }
            | Self::MalformedResponse { .. }
            | Self::ValidationFailed { .. } => ProviderErrorKind::Data,
            Self::Unexpected { .. } => ProviderErrorKind::Unexpected,
        }
    }

    /// Name of the provider the error came from.
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Timeout { provider }
            | Self::Authentication { provider, .. }
            | Self::RateLimited { provider }
            | Self::SymbolNotFound { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::ValidationFailed { provider, .. }
            | Self::Unexpected { provider, .. } => provider,
        }
    }

    /// Classify a `reqwest` transport error.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if err.is_decode() {
            Self::MalformedResponse {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Errors raised while building a provider from configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown provider kind: {0}")]
    UnknownKind(String),

    #[error("Missing setting '{setting}' for provider '{provider}'")]
    MissingSetting { provider: String, setting: String },

    #[error("Invalid setting '{setting}' for provider '{provider}': {message}")]
    InvalidSetting {
        provider: String,
        setting: String,
        message: String,
    },

    #[error("Failed to build HTTP client for provider '{provider}': {message}")]
    HttpClient { provider: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind() {
        let error = ProviderError::Transport {
            provider: "binance".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(error.kind(), ProviderErrorKind::Transport);
        assert_eq!(error.provider(), "binance");
    }

    #[test]
    fn test_data_kinds() {
        let not_found = ProviderError::SymbolNotFound {
            provider: "coinbase".to_string(),
            symbol: "NOPE-USD".to_string(),
        };
        let malformed = ProviderError::MalformedResponse {
            provider: "coinbase".to_string(),
            message: "expected value".to_string(),
        };
        let invalid = ProviderError::ValidationFailed {
            provider: "coinbase".to_string(),
            message: "non-positive price".to_string(),
        };
        assert_eq!(not_found.kind(), ProviderErrorKind::Data);
        assert_eq!(malformed.kind(), ProviderErrorKind::Data);
        assert_eq!(invalid.kind(), ProviderErrorKind::Data);
    }

    #[test]
    fn test_auth_and_rate_limit_kinds() {
        let auth = ProviderError::Authentication {
            provider: "metals".to_string(),
            message: "invalid api key".to_string(),
        };
        let limited = ProviderError::RateLimited {
            provider: "metals".to_string(),
        };
        assert_eq!(auth.kind(), ProviderErrorKind::Authentication);
        assert_eq!(limited.kind(), ProviderErrorKind::RateLimit);
        assert_eq!(limited.provider(), "metals");
    }

    #[test]
    fn test_error_display() {
        let error = ProviderError::Timeout {
            provider: "binance".to_string(),
        };
        assert_eq!(format!("{}", error), "Timeout: binance");

        let error = ProviderError::SymbolNotFound {
            provider: "binance".to_string(),
            symbol: "FOOBAR".to_string(),
        };
        assert_eq!(format!("{}", error), "Symbol not found: binance - FOOBAR");

        let error = RegistryError::MissingSetting {
            provider: "metals".to_string(),
            setting: "api_key".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Missing setting 'api_key' for provider 'metals'"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ProviderErrorKind::RateLimit.to_string(), "rate_limit");
        assert_eq!(ProviderErrorKind::Unexpected.to_string(), "unexpected");
    }
}
