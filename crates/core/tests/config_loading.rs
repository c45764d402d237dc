//! Integration tests for configuration loading and task construction.
//!
//! Each test writes a configuration directory into a temp dir and loads it
//! the same way the server does.

use std::fs;
use std::path::Path;
use std::time::Duration;

use pricemonitor_core::config::{build_tasks, load_app_config};
use pricemonitor_core::market_data::AssetClass;
use pricemonitor_core::{ConfigError, RetryPolicy};
use tempfile::tempdir;

// =============================================================================
// Fixtures
// =============================================================================

const SOURCES: &str = r#"
providers:
  binance:
    kind: binance
    settings:
      default_quote: USDT
  coinbase: {}
instruments:
  - symbol: BTCUSDT
    asset_class: crypto
    provider: binance
    base: BTC
    quote: USDT
    exchange: BINANCE
  - symbol: BTC/USD
    asset_class: crypto
    provider: coinbase
"#;

const SCHEDULES: &str = r#"
schedules:
  - symbol: BTCUSDT
    provider: binance
    interval_seconds: 5
  - symbol: BTC/USD
    provider: coinbase
    interval_seconds: 2.5
"#;

const STORAGE: &str = r#"
storage:
  backend: csv
  root: /var/lib/pricemonitor
"#;

fn write_config(dir: &Path, sources: &str, schedules: &str, storage: &str) {
    fs::write(dir.join("sources.yaml"), sources).unwrap();
    fs::write(dir.join("schedules.yaml"), schedules).unwrap();
    fs::write(dir.join("storage.yaml"), storage).unwrap();
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_full_config() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, SCHEDULES, STORAGE);

    let config = load_app_config(dir.path()).unwrap();

    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.providers["binance"].kind, "binance");
    // Kind defaults to the provider name
    assert_eq!(config.providers["coinbase"].kind, "coinbase");
    assert_eq!(config.instruments.len(), 2);
    assert_eq!(config.instruments[0].asset_class, AssetClass::Crypto);
    assert_eq!(config.schedules[1].interval_seconds, 2.5);
    assert_eq!(config.storage.root.to_str(), Some("/var/lib/pricemonitor"));
    assert_eq!(config.run.runner_config().unwrap().max_duration, None);
}

#[test]
fn test_empty_storage_file_uses_defaults() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, SCHEDULES, "");

    let config = load_app_config(dir.path()).unwrap();
    assert_eq!(config.storage.backend, "csv");
    assert_eq!(config.storage.root.to_str(), Some("data"));
}

#[test]
fn test_run_settings() {
    let dir = tempdir().unwrap();
    let schedules = format!(
        "{}\nrun:\n  max_duration_seconds: 30\n  retry:\n    policy: exponential\n    base_seconds: 1\n    jitter: 0.2\n",
        SCHEDULES
    );
    write_config(dir.path(), SOURCES, &schedules, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let runner = config.run.runner_config().unwrap();
    assert_eq!(runner.max_duration, Some(Duration::from_secs(30)));
    match runner.retry {
        RetryPolicy::Exponential(backoff) => {
            assert_eq!(backoff.base, Duration::from_secs(1));
            assert_eq!(backoff.cap, Duration::from_secs(60));
            assert!((backoff.jitter - 0.2).abs() < 1e-9);
        }
        other => panic!("expected exponential retry, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("sources.yaml"), SOURCES).unwrap();

    let error = load_app_config(dir.path()).unwrap_err();
    assert!(matches!(error, ConfigError::MissingFile(ref path) if path.ends_with("schedules.yaml")));
}

#[test]
fn test_unknown_asset_class_is_parse_error() {
    let dir = tempdir().unwrap();
    let sources = SOURCES.replace("asset_class: crypto\n    provider: coinbase", "asset_class: bond\n    provider: coinbase");
    write_config(dir.path(), &sources, SCHEDULES, STORAGE);

    let error = load_app_config(dir.path()).unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn test_unknown_backend() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, SCHEDULES, "storage:\n  backend: sqlite\n");

    let error = load_app_config(dir.path()).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidValue { ref key, .. } if key == "storage.backend"));
}

#[test]
fn test_invalid_retry_settings_fail_at_load() {
    let dir = tempdir().unwrap();
    let schedules = format!(
        "{}\nrun:\n  retry:\n    policy: exponential\n    cap_seconds: 0\n",
        SCHEDULES
    );
    write_config(dir.path(), SOURCES, &schedules, STORAGE);

    let error = load_app_config(dir.path()).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidValue { .. }));
}

// =============================================================================
// Task construction
// =============================================================================

#[test]
fn test_build_tasks() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, SCHEDULES, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let tasks = build_tasks(&config).unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].instrument().symbol, "BTCUSDT");
    assert_eq!(tasks[0].instrument().display_symbol(), "BTC/USDT");
    assert_eq!(tasks[0].provider_name(), "binance");
    assert_eq!(tasks[0].interval(), Duration::from_secs(5));
    assert_eq!(tasks[1].provider_name(), "coinbase");
    assert_eq!(tasks[1].interval(), Duration::from_millis(2500));
}

#[test]
fn test_empty_schedule_list_is_error() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, "schedules: []\n", STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    assert!(matches!(build_tasks(&config), Err(ConfigError::NoTasks)));
}

#[test]
fn test_schedule_without_instrument() {
    let dir = tempdir().unwrap();
    let schedules = "schedules:\n  - symbol: ETHUSDT\n    provider: binance\n    interval_seconds: 1\n";
    write_config(dir.path(), SOURCES, schedules, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let error = build_tasks(&config).unwrap_err();
    assert!(matches!(
        error,
        ConfigError::MissingInstrument { ref symbol, ref provider } if symbol == "ETHUSDT" && provider == "binance"
    ));
}

#[test]
fn test_schedule_with_unknown_provider() {
    let dir = tempdir().unwrap();
    let sources = format!(
        "{}  - symbol: XAU\n    asset_class: metal\n    provider: metals\n",
        SOURCES
    );
    let schedules = "schedules:\n  - symbol: XAU\n    provider: metals\n    interval_seconds: 60\n";
    write_config(dir.path(), &sources, schedules, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let error = build_tasks(&config).unwrap_err();
    assert!(matches!(error, ConfigError::UnknownProvider(ref name) if name == "metals"));
}

#[test]
fn test_unknown_provider_kind() {
    let dir = tempdir().unwrap();
    let sources = SOURCES.replace("kind: binance", "kind: tradingview");
    write_config(dir.path(), &sources, SCHEDULES, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let error = build_tasks(&config).unwrap_err();
    assert!(matches!(
        error,
        ConfigError::UnknownProviderKind { ref provider, ref kind } if provider == "binance" && kind == "tradingview"
    ));
}

#[test]
fn test_metal_provider_without_api_key() {
    let dir = tempdir().unwrap();
    let sources = format!(
        "{}  - symbol: XAU\n    asset_class: metal\n    provider: metals\n",
        SOURCES.replace("  coinbase: {}", "  coinbase: {}\n  metals:\n    kind: metal_price_api")
    );
    write_config(dir.path(), &sources, SCHEDULES, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let error = build_tasks(&config).unwrap_err();
    assert!(matches!(error, ConfigError::Provider(_)));
}

#[test]
fn test_non_positive_interval() {
    let dir = tempdir().unwrap();
    let schedules = "schedules:\n  - symbol: BTCUSDT\n    provider: binance\n    interval_seconds: 0\n";
    write_config(dir.path(), SOURCES, schedules, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let error = build_tasks(&config).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidInterval { .. }));
}

#[test]
fn test_find_instrument_ignores_case() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), SOURCES, SCHEDULES, STORAGE);

    let config = load_app_config(dir.path()).unwrap();
    let instrument = config.find_instrument("btcusdt").unwrap();
    assert_eq!(instrument.display_symbol(), "BTC/USDT");
    assert!(config.find_instrument("DOGE").is_none());
}
