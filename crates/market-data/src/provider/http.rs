//! Shared HTTP plumbing for REST-based providers.

use std::str::FromStr;
use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use crate::errors::{ProviderError, RegistryError};

/// Default HTTP request timeout
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client with the request timeout applied. A provider is never built
/// without it.
pub(crate) fn build_client(provider: &str) -> Result<Client, RegistryError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("pricemonitor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RegistryError::HttpClient {
            provider: provider.to_string(),
            message: e.to_string(),
        })
}

/// Map a non-success HTTP status to a classified error.
///
/// Returns `None` for success statuses.
pub(crate) fn classify_status(provider: &str, status: StatusCode, body: &str) -> Option<ProviderError> {
    if status.is_success() {
        return None;
    }

    let provider = provider.to_string();
    let error = match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::IM_A_TEAPOT => {
            ProviderError::RateLimited { provider }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication {
            provider,
            message: format!("HTTP {}", status),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::Timeout { provider }
        }
        _ => ProviderError::Transport {
            provider,
            message: format!("HTTP {} - {}", status, truncate(body, 200)),
        },
    };
    Some(error)
}

/// GET `url` with the given query parameters and return status and body,
/// whatever the status.
pub(crate) async fn get_raw(
    client: &Client,
    provider: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<(StatusCode, String), ProviderError> {
    debug!("{} request: {} with {} params", provider, url, params.len());

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    Ok((status, body))
}

/// GET `url` with the given query parameters and return the body on success.
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, ProviderError> {
    let (status, body) = get_raw(client, provider, url, params).await?;
    match classify_status(provider, status, &body) {
        Some(error) => Err(error),
        None => Ok(body),
    }
}

/// Parse a decimal price string as returned by most REST APIs.
pub(crate) fn parse_price(provider: &str, raw: &str) -> Result<Decimal, ProviderError> {
    Decimal::from_str(raw.trim()).map_err(|e| ProviderError::MalformedResponse {
        provider: provider.to_string(),
        message: format!("invalid price '{}': {}", raw, e),
    })
}

/// Build a parse error for a JSON body.
pub(crate) fn malformed(provider: &str, err: serde_json::Error) -> ProviderError {
    ProviderError::MalformedResponse {
        provider: provider.to_string(),
        message: err.to_string(),
    }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_build_client_reports_failures_as_registry_errors() {
        assert!(build_client("binance").is_ok());

        let error = RegistryError::HttpClient {
            provider: "binance".to_string(),
            message: "TLS backend unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to build HTTP client for provider 'binance': TLS backend unavailable"
        );
    }

    #[test]
    fn test_success_status_is_not_an_error() {
        assert!(classify_status("binance", StatusCode::OK, "{}").is_none());
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, ProviderErrorKind::RateLimit),
            (StatusCode::IM_A_TEAPOT, ProviderErrorKind::RateLimit),
            (StatusCode::UNAUTHORIZED, ProviderErrorKind::Authentication),
            (StatusCode::FORBIDDEN, ProviderErrorKind::Authentication),
            (StatusCode::GATEWAY_TIMEOUT, ProviderErrorKind::Timeout),
            (StatusCode::INTERNAL_SERVER_ERROR, ProviderErrorKind::Transport),
            (StatusCode::BAD_REQUEST, ProviderErrorKind::Transport),
        ];
        for (status, kind) in cases {
            let error = classify_status("binance", status, "").unwrap();
            assert_eq!(error.kind(), kind, "status {}", status);
        }
    }

    #[test]
    fn test_transport_message_is_truncated() {
        let body = "x".repeat(1000);
        let error = classify_status("binance", StatusCode::BAD_GATEWAY, &body).unwrap();
        assert!(error.to_string().len() < 300);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("binance", " 64250.12000000 ").unwrap(), dec!(64250.12));
        let error = parse_price("binance", "n/a").unwrap_err();
        assert_eq!(error.kind(), ProviderErrorKind::Data);
    }
}
