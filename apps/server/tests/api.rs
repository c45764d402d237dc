use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use pricemonitor_core::market_data::{AssetClass, Instrument, Quote};
use pricemonitor_server::{api::app_router, build_runner, build_state, config::Config, AppState};
use rust_decimal_macros::dec;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const SOURCES: &str = r#"
providers:
  binance:
    kind: binance
instruments:
  - symbol: BTCUSDT
    asset_class: crypto
    provider: binance
    base: BTC
    quote: USDT
"#;

const SCHEDULES: &str = r#"
schedules:
  - symbol: BTCUSDT
    provider: binance
    interval_seconds: 5
run:
  max_duration_seconds: 10
"#;

fn write_config(dir: &Path) {
    let data = dir.join("data");
    fs::write(dir.join("sources.yaml"), SOURCES).unwrap();
    fs::write(dir.join("schedules.yaml"), SCHEDULES).unwrap();
    fs::write(
        dir.join("storage.yaml"),
        format!("storage:\n  backend: csv\n  root: {}\n", data.display()),
    )
    .unwrap();
}

fn config_for(dir: &Path, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = extra
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.insert(
        "PRICEMONITOR_CONFIG".to_string(),
        dir.to_string_lossy().to_string(),
    );
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

async fn setup() -> (TempDir, Arc<AppState>, Router) {
    let tmp = tempdir().unwrap();
    write_config(tmp.path());
    let config = config_for(tmp.path(), &[]);
    let state = build_state(&config).await.unwrap();
    let app = app_router(state.clone(), &config);
    (tmp, state, app)
}

fn btc() -> Instrument {
    Instrument::new("BTCUSDT", AssetClass::Crypto).with_pair("BTC", "USDT")
}

async fn seed(state: &AppState, count: u32) {
    for n in 0..count {
        let quote = Quote::new(
            btc(),
            dec!(60000) + rust_decimal::Decimal::from(n),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, n).unwrap(),
            "USDT",
            "binance",
        );
        state.store.append(&quote).await.unwrap();
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_works() {
    let (_tmp, _state, app) = setup().await;

    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn latest_without_data_reports_no_data() {
    let (_tmp, _state, app) = setup().await;

    let (status, body) = get_json(app, "/prices/latest?symbol=BTCUSDT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BTCUSDT");
    assert_eq!(body["error"], "no data");
}

#[tokio::test]
async fn latest_returns_most_recent_quote() {
    let (_tmp, state, app) = setup().await;
    seed(&state, 3).await;

    // Lookup ignores case and still finds the configured pair
    let (status, body) = get_json(app, "/prices/latest?symbol=btcusdt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BTCUSDT");
    assert_eq!(body["display_symbol"], "BTC/USDT");
    assert_eq!(body["price"].as_f64(), Some(60002.0));
    assert_eq!(body["currency"], "USDT");
    assert_eq!(body["provider"], "binance");
    assert_eq!(body["timestamp"], "2024-06-01T00:00:02+00:00");
}

#[tokio::test]
async fn history_honours_limit() {
    let (_tmp, state, app) = setup().await;
    seed(&state, 5).await;

    let (status, body) = get_json(app.clone(), "/prices/history?symbol=BTCUSDT&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![60003.0, 60004.0]);

    let (_, body) = get_json(app, "/prices/history?symbol=BTCUSDT").await;
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn history_for_unknown_symbol_is_empty() {
    let (_tmp, _state, app) = setup().await;

    let (status, body) = get_json(app, "/prices/history?symbol=DOGE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn blank_symbol_is_bad_request() {
    let (_tmp, _state, app) = setup().await;

    let (status, body) = get_json(app, "/prices/latest?symbol=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn storage_error_maps_to_500() {
    let (_tmp, state, app) = setup().await;
    fs::write(
        state.app_config.storage.root.join("btcusdt.csv"),
        "date,close\n2024-06-01,1\n",
    )
    .unwrap();

    let (status, body) = get_json(app, "/prices/latest?symbol=BTCUSDT").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);
    assert!(body["message"].as_str().unwrap().contains("Unexpected header"));
}

#[tokio::test]
async fn runner_uses_environment_duration_override() {
    let tmp = tempdir().unwrap();
    write_config(tmp.path());

    let config = config_for(tmp.path(), &[]);
    let state = build_state(&config).await.unwrap();
    let (runner, tasks) = build_runner(&config, &state).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        runner.config().max_duration,
        Some(std::time::Duration::from_secs(10))
    );

    let config = config_for(tmp.path(), &[("PRICEMONITOR_MAX_DURATION_SECS", "3")]);
    let (runner, _) = build_runner(&config, &state).unwrap();
    assert_eq!(
        runner.config().max_duration,
        Some(std::time::Duration::from_secs(3))
    );
}

#[tokio::test]
async fn missing_config_dir_fails() {
    let tmp = tempdir().unwrap();
    let config = config_for(&tmp.path().join("absent"), &[]);
    assert!(build_state(&config).await.is_err());
}
