//! Read-only HTTP facade over the quote store.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use pricemonitor_core::market_data::Quote;

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Quote as returned by the price endpoints.
#[derive(Debug, Serialize)]
pub struct PriceView {
    pub symbol: String,
    pub display_symbol: String,
    pub price: Decimal,
    pub timestamp: String,
    pub currency: String,
    pub provider: String,
}

impl From<Quote> for PriceView {
    fn from(quote: Quote) -> Self {
        Self {
            display_symbol: quote.instrument.display_symbol(),
            symbol: quote.instrument.symbol,
            price: quote.price,
            timestamp: quote.timestamp.to_rfc3339(),
            currency: quote.currency,
            provider: quote.provider,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum LatestResponse {
    Price(PriceView),
    Missing { symbol: String, error: &'static str },
}

#[derive(Deserialize)]
struct LatestQuery {
    symbol: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    symbol: String,
    limit: Option<usize>,
}

fn require_symbol(symbol: &str) -> ApiResult<&str> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn latest_price(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LatestQuery>,
) -> ApiResult<Json<LatestResponse>> {
    let symbol = require_symbol(&q.symbol)?;
    let instrument = state.resolve_instrument(symbol);

    let response = match state.store.latest(&instrument).await? {
        Some(quote) => LatestResponse::Price(quote.into()),
        None => LatestResponse::Missing {
            symbol: symbol.to_string(),
            error: "no data",
        },
    };
    Ok(Json(response))
}

async fn price_history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<PriceView>>> {
    let symbol = require_symbol(&q.symbol)?;
    let instrument = state.resolve_instrument(symbol);

    let quotes = state.store.history(&instrument, q.limit).await?;
    Ok(Json(quotes.into_iter().map(PriceView::from).collect()))
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/prices/latest", get(latest_price))
        .route("/prices/history", get(price_history))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
