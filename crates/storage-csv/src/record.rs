//! On-disk record format.
//!
//! One header row, then one row per quote:
//!
//! ```text
//! timestamp,provider,symbol,display_symbol,price,currency
//! 2024-05-01T12:00:00+00:00,binance,BTCUSDT,BTC/USDT,64250.1200000000,USDT
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::{StringRecord, Terminator, WriterBuilder};
use rust_decimal::Decimal;

use pricemonitor_core::StorageError;
use pricemonitor_market_data::{Instrument, Quote};

pub const HEADER: [&str; 6] = [
    "timestamp",
    "provider",
    "symbol",
    "display_symbol",
    "price",
    "currency",
];

/// Fractional digits written for prices.
pub const PRICE_SCALE: u32 = 10;

/// Encode a single row, including its trailing newline.
fn encode_row<I, T>(fields: I) -> Result<Vec<u8>, StorageError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(|e| StorageError::Csv(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| StorageError::Csv(e.to_string()))
}

pub fn encode_header() -> Result<Vec<u8>, StorageError> {
    encode_row(HEADER)
}

/// Encode a quote as one complete row.
pub fn encode_quote(quote: &Quote) -> Result<Vec<u8>, StorageError> {
    let price = format!("{:.*}", PRICE_SCALE as usize, quote.price.round_dp(PRICE_SCALE));
    encode_row([
        quote.timestamp.to_rfc3339(),
        quote.provider.clone(),
        quote.instrument.symbol.clone(),
        quote.instrument.display_symbol(),
        price,
        quote.currency.clone(),
    ])
}

pub fn is_expected_header(record: &StringRecord) -> bool {
    record.len() == HEADER.len() && record.iter().zip(HEADER).all(|(found, want)| found == want)
}

/// Rebuild a quote from a row, attaching the caller's instrument.
pub fn decode_quote(record: &StringRecord, instrument: &Instrument) -> Result<Quote, String> {
    if record.len() != HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            HEADER.len(),
            record.len()
        ));
    }

    let timestamp = DateTime::parse_from_rfc3339(&record[0])
        .map_err(|e| format!("invalid timestamp '{}': {}", &record[0], e))?
        .with_timezone(&Utc);
    let provider = &record[1];
    let price = Decimal::from_str(&record[4])
        .map_err(|e| format!("invalid price '{}': {}", &record[4], e))?;
    let currency = &record[5];

    if provider.is_empty() || currency.is_empty() {
        return Err("empty provider or currency".to_string());
    }

    Ok(Quote::new(
        instrument.clone(),
        price,
        timestamp,
        currency,
        provider,
    ))
}
