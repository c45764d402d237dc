//! CSV-backed [`QuoteStore`].
//!
//! One file per log key under the storage root. File I/O runs on the
//! blocking pool while the caller holds the per-log lock: appends take the
//! write side, reads take the read side.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use tokio::sync::RwLock;
use tokio::task;

use pricemonitor_core::{log_key, QuoteStore, StorageError};
use pricemonitor_market_data::{Instrument, Quote};

use crate::record::{decode_quote, encode_header, encode_quote, is_expected_header, HEADER};

/// Append-only CSV quote store.
pub struct CsvQuoteStore {
    root: PathBuf,
    locks: DashMap<String, Arc<RwLock<()>>>,
}

impl CsvQuoteStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        info!("CSV quote store at {}", root.display());
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the log of `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}.csv", log_key(symbol)))
    }

    fn lock_for(&self, symbol: &str) -> Arc<RwLock<()>> {
        self.locks
            .entry(log_key(symbol))
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Lock of an existing log. Absent logs get no entry, so reads of
    /// unknown symbols do not grow the map.
    async fn existing_lock(&self, symbol: &str) -> Result<Option<Arc<RwLock<()>>>, StorageError> {
        if let Some(lock) = self.locks.get(&log_key(symbol)) {
            return Ok(Some(lock.clone()));
        }
        let path = self.path_for(symbol);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(self.lock_for(symbol))),
            Ok(false) => Ok(None),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn read_log(&self, instrument: &Instrument) -> Result<Vec<Quote>, StorageError> {
        let Some(lock) = self.existing_lock(&instrument.symbol).await? else {
            debug!("No quote log for {}", instrument.symbol);
            return Ok(Vec::new());
        };
        let path = self.path_for(&instrument.symbol);
        let _guard = lock.read().await;

        let instrument = instrument.clone();
        task::spawn_blocking(move || read_records(&path, &instrument))
            .await
            .map_err(|e| StorageError::Join(e.to_string()))?
    }
}

#[async_trait]
impl QuoteStore for CsvQuoteStore {
    async fn append(&self, quote: &Quote) -> Result<(), StorageError> {
        let path = self.path_for(&quote.instrument.symbol);
        let record = encode_quote(quote)?;
        let lock = self.lock_for(&quote.instrument.symbol);
        let _guard = lock.write().await;

        task::spawn_blocking(move || append_record(&path, &record))
            .await
            .map_err(|e| StorageError::Join(e.to_string()))?
    }

    async fn latest(&self, instrument: &Instrument) -> Result<Option<Quote>, StorageError> {
        Ok(self.read_log(instrument).await?.pop())
    }

    async fn history(
        &self,
        instrument: &Instrument,
        limit: Option<usize>,
    ) -> Result<Vec<Quote>, StorageError> {
        let mut quotes = self.read_log(instrument).await?;
        if let Some(limit) = limit {
            let skip = quotes.len().saturating_sub(limit);
            quotes.drain(..skip);
        }
        Ok(quotes)
    }
}

/// Append one encoded row, writing the header first for a new log.
fn append_record(path: &Path, record: &[u8]) -> Result<(), StorageError> {
    let io_err = |e| StorageError::io(path, e);

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();

    let mut buf = Vec::with_capacity(record.len() + 64);
    if len == 0 {
        info!("Creating quote log {}", path.display());
        buf.extend_from_slice(&encode_header()?);
    } else {
        check_header(path, &mut file)?;

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(io_err)?;
        file.read_exact(&mut last).map_err(io_err)?;
        if last[0] != b'\n' {
            warn!("Terminating incomplete last line in {}", path.display());
            buf.push(b'\n');
        }
    }
    buf.extend_from_slice(record);

    file.write_all(&buf).map_err(io_err)?;
    file.sync_data().map_err(io_err)?;
    Ok(())
}

/// Verify the first line of an existing log.
fn check_header(path: &Path, file: &mut File) -> Result<(), StorageError> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| StorageError::io(path, e))?;
    let mut first = String::new();
    BufReader::new(&mut *file)
        .read_line(&mut first)
        .map_err(|e| StorageError::io(path, e))?;

    let found = first.trim_end_matches(['\r', '\n']);
    if found != HEADER.join(",") {
        return Err(StorageError::SchemaMismatch {
            path: path.to_path_buf(),
            found: found.to_string(),
        });
    }
    Ok(())
}

/// Read every parsable record, oldest first.
fn read_records(path: &Path, instrument: &Instrument) -> Result<Vec<Quote>, StorageError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| StorageError::Csv(e.to_string()))?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !is_expected_header(&headers) {
        return Err(StorageError::SchemaMismatch {
            path: path.to_path_buf(),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut quotes = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let decoded = row
            .map_err(|e| e.to_string())
            .and_then(|record| decode_quote(&record, instrument));
        match decoded {
            Ok(quote) => quotes.push(quote),
            Err(reason) => warn!(
                "Skipping malformed row {} in {}: {}",
                index + 2,
                path.display(),
                reason
            ),
        }
    }

    debug!("Read {} quotes from {}", quotes.len(), path.display());
    Ok(quotes)
}
