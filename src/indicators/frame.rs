// =============================================================================
// Indicator Frame: bar series plus derived indicator columns
// =============================================================================
//
// Every row is an explicit record with one optional field per derived column.
// `None` means "undefined": the column is absent for this frame, the row sits
// inside a look-back warm-up, or the computation was non-finite.  Which
// columns exist is fixed when the frame is built; consumers never check for
// columns ad hoc.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::atr::calculate_atr;
use super::bollinger::calculate_bollinger;
use super::macd::calculate_macd;
use super::rsi::calculate_rsi;
use super::sma::rolling_mean;
use crate::market_data::{BarSeries, ColumnSet};

/// One row of an [`IndicatorFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub amount: f64,

    // --- base indicators ------------------------------------------------------
    #[serde(rename = "MA5")]
    pub ma_short: Option<f64>,
    #[serde(rename = "MA20")]
    pub ma_medium: Option<f64>,
    #[serde(rename = "MA60")]
    pub ma_long: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "BB_Upper")]
    pub bb_upper: Option<f64>,
    #[serde(rename = "BB_Middle")]
    pub bb_middle: Option<f64>,
    #[serde(rename = "BB_Lower")]
    pub bb_lower: Option<f64>,
    #[serde(rename = "ATR")]
    pub atr: Option<f64>,
    #[serde(rename = "Volume_MA")]
    pub volume_ma: Option<f64>,

    // --- futures extension ----------------------------------------------------
    #[serde(rename = "OI_MA")]
    pub oi_ma: Option<f64>,
    #[serde(rename = "OI_Change")]
    pub oi_change: Option<f64>,
    #[serde(rename = "OI_Volume_Ratio")]
    pub oi_volume_ratio: Option<f64>,
    pub momentum: Option<f64>,
    #[serde(rename = "PVT")]
    pub pvt: Option<f64>,
    pub log_returns: Option<f64>,
    pub volatility_std: Option<f64>,
}

/// Indicator-augmented bar series.  Row count and dates always match the
/// source series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
    columns: ColumnSet,
}

impl IndicatorFrame {
    /// Copy the raw bar columns into a frame with every indicator undefined.
    pub fn from_bars(bars: &BarSeries) -> Self {
        let rows = bars
            .bars()
            .iter()
            .map(|b| IndicatorRow {
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
                open_interest: b.open_interest,
                amount: b.amount,
                ma_short: None,
                ma_medium: None,
                ma_long: None,
                macd: None,
                signal: None,
                histogram: None,
                rsi: None,
                bb_upper: None,
                bb_middle: None,
                bb_lower: None,
                atr: None,
                volume_ma: None,
                oi_ma: None,
                oi_change: None,
                oi_volume_ratio: None,
                momentum: None,
                pvt: None,
                log_returns: None,
                volatility_std: None,
            })
            .collect();
        Self {
            rows,
            columns: bars.columns(),
        }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [IndicatorRow] {
        &mut self.rows
    }

    /// Source columns the data provider actually supplied.
    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn has_volume(&self) -> bool {
        self.columns.volume
    }

    pub fn has_open_interest(&self) -> bool {
        self.columns.open_interest
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// The row before the latest one, or the latest row itself when the frame
    /// has a single row.
    pub fn previous(&self) -> Option<&IndicatorRow> {
        match self.rows.len() {
            0 => None,
            1 => self.rows.first(),
            n => self.rows.get(n - 2),
        }
    }

    /// Row `n` positions back from the latest (`back(0)` is the latest).
    pub fn back(&self, n: usize) -> Option<&IndicatorRow> {
        self.rows.len().checked_sub(n + 1).and_then(|i| self.rows.get(i))
    }

    /// The most recent `n` rows, oldest first.
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

// =============================================================================
// Base indicator capability
// =============================================================================

fn default_ma_short() -> usize {
    5
}

fn default_ma_medium() -> usize {
    20
}

fn default_ma_long() -> usize {
    60
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_rsi_period() -> usize {
    14
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_std() -> f64 {
    2.0
}

fn default_atr_period() -> usize {
    14
}

fn default_volume_ma_period() -> usize {
    20
}

/// Look-back parameters for the generic indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_ma_short")]
    pub ma_short: usize,
    #[serde(default = "default_ma_medium")]
    pub ma_medium: usize,
    #[serde(default = "default_ma_long")]
    pub ma_long: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_std")]
    pub bollinger_std: f64,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default = "default_volume_ma_period")]
    pub volume_ma_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: default_ma_short(),
            ma_medium: default_ma_medium(),
            ma_long: default_ma_long(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            rsi_period: default_rsi_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_std: default_bollinger_std(),
            atr_period: default_atr_period(),
            volume_ma_period: default_volume_ma_period(),
        }
    }
}

impl IndicatorParams {
    /// Every period with its name, for validation.
    pub fn periods(&self) -> [(&'static str, usize); 10] {
        [
            ("ma_short", self.ma_short),
            ("ma_medium", self.ma_medium),
            ("ma_long", self.ma_long),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("volume_ma_period", self.volume_ma_period),
        ]
    }
}

/// Generic indicator computation producing the base columns of a frame.
pub trait BaseIndicators: Send + Sync {
    fn compute(&self, bars: &BarSeries) -> IndicatorFrame;

    /// Parameters used, so callers can validate them before computing.
    fn params(&self) -> &IndicatorParams;
}

/// Default [`BaseIndicators`] implementation.
#[derive(Debug, Clone, Default)]
pub struct StandardIndicators {
    params: IndicatorParams,
}

impl StandardIndicators {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }
}

impl BaseIndicators for StandardIndicators {
    fn compute(&self, bars: &BarSeries) -> IndicatorFrame {
        let p = &self.params;
        let closes = bars.closes();
        let mut frame = IndicatorFrame::from_bars(bars);

        let ma_short = rolling_mean(&closes, p.ma_short);
        let ma_medium = rolling_mean(&closes, p.ma_medium);
        let ma_long = rolling_mean(&closes, p.ma_long);
        let macd = calculate_macd(&closes, p.macd_fast, p.macd_slow, p.macd_signal);
        let rsi = calculate_rsi(&closes, p.rsi_period);
        let bb = calculate_bollinger(&closes, p.bollinger_period, p.bollinger_std);
        let columns = bars.columns();
        let atr = if columns.high && columns.low {
            calculate_atr(bars.bars(), p.atr_period)
        } else {
            debug!("high/low columns absent, ATR omitted");
            vec![None; closes.len()]
        };
        let volume_ma = if columns.volume {
            rolling_mean(&bars.volumes(), p.volume_ma_period)
        } else {
            debug!("volume column absent, Volume_MA omitted");
            vec![None; closes.len()]
        };

        for (i, row) in frame.rows_mut().iter_mut().enumerate() {
            row.ma_short = ma_short[i];
            row.ma_medium = ma_medium[i];
            row.ma_long = ma_long[i];
            row.macd = macd.macd[i];
            row.signal = macd.signal[i];
            row.histogram = macd.histogram[i];
            row.rsi = rsi[i];
            row.bb_upper = bb.upper[i];
            row.bb_middle = bb.middle[i];
            row.bb_lower = bb.lower[i];
            row.atr = atr[i];
            row.volume_ma = volume_ma[i];
        }

        debug!(rows = frame.len(), "base indicators computed");
        frame
    }

    fn params(&self) -> &IndicatorParams {
        &self.params
    }
}
