// =============================================================================
// CSV Data Source: one file per instrument
// =============================================================================
//
// Reads `<data_dir>/<code>.csv`.  The header row is matched
// case-insensitively:
//
//   date            required, YYYY-MM-DD or YYYYMMDD
//   close           required
//   open high low volume
//   open_interest   also `openinterest` / `oi`
//   amount          also `turnover`
//
// Optional columns that are absent are zero-filled and reported through the
// series' `ColumnSet`.  Empty optional cells read as 0.
// =============================================================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, instrument, warn};

use crate::analyzer::source::{parse_date, DataSource, DateRange, FetchError, DEFAULT_LOOKBACK_DAYS};
use crate::market_data::{Bar, BarSeries, ColumnSet};

#[derive(Debug, Clone)]
pub struct CsvDataSource {
    data_dir: PathBuf,
    lookback_days: i64,
}

impl CsvDataSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, code: &str) -> Option<PathBuf> {
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !code.contains("..");
        valid.then(|| self.data_dir.join(format!("{code}.csv")))
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    #[instrument(skip(self), name = "csv::fetch")]
    async fn fetch(
        &self,
        instrument_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, FetchError> {
        let path = self
            .path_for(instrument_id)
            .ok_or_else(|| FetchError::NotFound(instrument_id.to_string()))?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(instrument_id.to_string()));
            }
            Err(e) => {
                return Err(FetchError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let range = DateRange::resolve(start, end, self.lookback_days);
        let series = parse_bars(&bytes, &path.display().to_string(), range)?;
        debug!(
            futures_code = %instrument_id,
            rows = series.len(),
            start = %range.start,
            end = %range.end,
            "csv series loaded"
        );
        Ok(series)
    }
}

// =============================================================================
// Parsing
// =============================================================================

struct ColumnIndex {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
    open_interest: Option<usize>,
    amount: Option<usize>,
}

impl ColumnIndex {
    fn locate(headers: &StringRecord, file: &str) -> Result<Self, FetchError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let required = |names: &[&str], column: &'static str| {
            find(names).ok_or_else(|| FetchError::MissingColumn {
                file: file.to_string(),
                column,
            })
        };

        Ok(Self {
            date: required(&["date", "trade_date"], "date")?,
            close: required(&["close"], "close")?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            volume: find(&["volume", "vol"]),
            open_interest: find(&["open_interest", "openinterest", "oi", "hold"]),
            amount: find(&["amount", "turnover"]),
        })
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet {
            open: self.open.is_some(),
            high: self.high.is_some(),
            low: self.low.is_some(),
            volume: self.volume.is_some(),
            open_interest: self.open_interest.is_some(),
            amount: self.amount.is_some(),
        }
    }
}

fn number(record: &StringRecord, idx: usize, file: &str, row: usize) -> Result<f64, FetchError> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| FetchError::Malformed {
        file: file.to_string(),
        row,
        message: format!("'{raw}' is not a number"),
    })
}

fn optional_number(
    record: &StringRecord,
    idx: Option<usize>,
    file: &str,
    row: usize,
) -> Result<f64, FetchError> {
    match idx {
        Some(i) if !record.get(i).unwrap_or("").trim().is_empty() => number(record, i, file, row),
        _ => Ok(0.0),
    }
}

/// Parse CSV bytes into a bar series restricted to `range`.
pub fn parse_bars(data: &[u8], file: &str, range: DateRange) -> Result<BarSeries, FetchError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);
    let headers = reader.headers()?.clone();
    let idx = ColumnIndex::locate(&headers, file)?;
    let columns = idx.columns();

    let missing = columns.missing();
    if !missing.is_empty() {
        warn!(file, missing = ?missing, "columns absent, zero-filled");
    }

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let date = parse_date(record.get(idx.date).unwrap_or("")).map_err(|e| FetchError::Malformed {
            file: file.to_string(),
            row,
            message: e.to_string(),
        })?;
        if !range.contains(date) {
            continue;
        }

        let close = number(&record, idx.close, file, row)?;
        bars.push(Bar {
            date,
            open: optional_number(&record, idx.open, file, row)?,
            high: optional_number(&record, idx.high, file, row)?,
            low: optional_number(&record, idx.low, file, row)?,
            close,
            volume: optional_number(&record, idx.volume, file, row)?,
            open_interest: optional_number(&record, idx.open_interest, file, row)?,
            amount: optional_number(&record, idx.amount, file, row)?,
        });
    }

    Ok(BarSeries::new(bars, columns)?)
}
