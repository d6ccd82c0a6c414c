// =============================================================================
// Data Source: where bar series come from
// =============================================================================
//
// `DataSource` is the narrow seam between the engine and market data.  Batch
// fetching runs every request concurrently under a semaphore; a failed or
// empty fetch is logged and excluded, never retried, and never affects the
// other instruments.  Results come back in request order.
// =============================================================================

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::market_data::{BarSeries, SeriesError};

/// Default look-back when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data for {0}")]
    NotFound(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD or YYYYMMDD")]
    InvalidDate(String),

    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: &'static str },

    #[error("{file}: row {row}: {message}")]
    Malformed {
        file: String,
        row: usize,
        message: String,
    },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Supplier of date-ordered bar series.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Bars for `instrument_id` between `start` and `end` (inclusive).  `None`
    /// bounds fall back to the source's default range.
    async fn fetch(
        &self,
        instrument_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, FetchError>;
}

// =============================================================================
// Date range
// =============================================================================

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Fill missing bounds: `end` defaults to today, `start` to `end` minus
    /// `lookback_days`.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, lookback_days: i64) -> Self {
        Self::resolve_from(start, end, lookback_days, Local::now().date_naive())
    }

    pub fn resolve_from(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lookback_days: i64,
        today: NaiveDate,
    ) -> Self {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(end - Duration::days(lookback_days));
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Parse `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, FetchError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| FetchError::InvalidDate(s.to_string()))
}

// =============================================================================
// Batch fetch
// =============================================================================

/// Fetch many instruments with at most `max_concurrency` requests in flight.
///
/// Returns the successful, non-empty series in the order of `codes`.
pub async fn fetch_many(
    source: &dyn DataSource,
    codes: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    max_concurrency: usize,
) -> Vec<(String, BarSeries)> {
    let semaphore = Semaphore::new(max_concurrency.max(1));

    let requests = codes.iter().map(|code| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.ok()?;
            match source.fetch(code, start, end).await {
                Ok(series) if series.is_empty() => {
                    warn!(futures_code = %code, "empty series, excluded from batch");
                    None
                }
                Ok(series) => {
                    debug!(futures_code = %code, rows = series.len(), "fetched");
                    Some((code.clone(), series))
                }
                Err(e) => {
                    warn!(futures_code = %code, error = %e, "fetch failed, excluded from batch");
                    None
                }
            }
        }
    });

    let fetched: Vec<(String, BarSeries)> = join_all(requests).await.into_iter().flatten().collect();
    debug!(requested = codes.len(), fetched = fetched.len(), "batch fetch complete");
    fetched
}
