// =============================================================================
// Bar Series: date-ordered OHLCV + open-interest observations
// =============================================================================
//
// A `BarSeries` is the immutable input to every derivation in the engine.
// Construction sorts by date and rejects duplicate dates, so downstream code
// can rely on strictly ascending rows.
//
// Columns a data source could not supply are zero-filled; `ColumnSet` records
// which columns were genuinely present so the indicator extension can omit the
// derived columns that depend on them.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub open_interest: f64,
    #[serde(default)]
    pub amount: f64,
}

impl Bar {
    /// A bar with only a close price; every other column is zero.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            open_interest: 0.0,
            amount: 0.0,
        }
    }
}

/// Which optional columns the data source actually supplied.
///
/// `Close` is mandatory and therefore not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub open: bool,
    pub high: bool,
    pub low: bool,
    pub volume: bool,
    pub open_interest: bool,
    pub amount: bool,
}

impl ColumnSet {
    pub const ALL: ColumnSet = ColumnSet {
        open: true,
        high: true,
        low: true,
        volume: true,
        open_interest: true,
        amount: true,
    };

    pub const CLOSE_ONLY: ColumnSet = ColumnSet {
        open: false,
        high: false,
        low: false,
        volume: false,
        open_interest: false,
        amount: false,
    };

    /// Names of the columns that are absent, for diagnostics.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for (present, name) in [
            (self.open, "Open"),
            (self.high, "High"),
            (self.low, "Low"),
            (self.volume, "Volume"),
            (self.open_interest, "OpenInterest"),
            (self.amount, "Amount"),
        ] {
            if !present {
                out.push(name);
            }
        }
        out
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("duplicate bar date {0}")]
    DuplicateDate(NaiveDate),
}

/// Immutable, strictly ascending sequence of bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
    columns: ColumnSet,
}

impl BarSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; two bars sharing a date is an error.
    pub fn new(mut bars: Vec<Bar>, columns: ColumnSet) -> Result<Self, SeriesError> {
        bars.sort_by_key(|b| b.date);
        if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeriesError::DuplicateDate(w[1].date));
        }
        Ok(Self { bars, columns })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn open_interests(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open_interest).collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}
