// =============================================================================
// Futures Indicator Extension
// =============================================================================
//
// Layers futures-specific columns on top of the base indicator frame:
//
//   OI_Change        (OI_t - OI_{t-1}) / OI_{t-1} * 100
//   OI_MA            SMA of open interest (default 14)
//   OI_Volume_Ratio  OI_t / Volume_t, undefined where volume is zero
//   Momentum         Close_t - Close_{t-n} (default 10)
//   PVT              running sum of pct_change(Close) * Volume
//   LogReturns       ln(Close_t / Close_{t-1})
//   VolatilityStd    sample σ of log returns over the trailing window of
//                    `volatility_period` closes, × sqrt(252)
//
// Columns whose inputs the data source did not supply are left undefined and
// a warning is logged.  Structural problems (empty input, zero periods) are
// returned as `DeriveError` because a partial frame would score misleadingly.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::frame::{BaseIndicators, IndicatorFrame, IndicatorParams, StandardIndicators};
use super::sma::{rolling_mean, std_dev, StdKind};
use super::{finite, Series};
use crate::market_data::BarSeries;

/// Trading days per year used to annualise volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Error, PartialEq)]
pub enum DeriveError {
    #[error("cannot derive indicators from an empty bar series")]
    EmptySeries,

    #[error("invalid look-back period {name} = {value}")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("base indicators returned {actual} rows for {expected} bars")]
    RowMismatch { expected: usize, actual: usize },
}

fn default_basis_ma_period() -> usize {
    20
}

fn default_open_interest_ma_period() -> usize {
    14
}

fn default_momentum_period() -> usize {
    10
}

fn default_volatility_period() -> usize {
    20
}

/// Look-back parameters for the futures-specific columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesParams {
    /// Rolling window for the term-structure spread mean / deviation.
    #[serde(default = "default_basis_ma_period")]
    pub basis_ma_period: usize,
    #[serde(default = "default_open_interest_ma_period")]
    pub open_interest_ma_period: usize,
    #[serde(default = "default_momentum_period")]
    pub momentum_period: usize,
    #[serde(default = "default_volatility_period")]
    pub volatility_period: usize,
}

impl Default for FuturesParams {
    fn default() -> Self {
        Self {
            basis_ma_period: default_basis_ma_period(),
            open_interest_ma_period: default_open_interest_ma_period(),
            momentum_period: default_momentum_period(),
            volatility_period: default_volatility_period(),
        }
    }
}

/// Two-stage indicator pipeline: base columns from `B`, then futures columns.
#[derive(Debug, Clone)]
pub struct FuturesIndicators<B = StandardIndicators> {
    base: B,
    params: FuturesParams,
}

impl FuturesIndicators<StandardIndicators> {
    pub fn new(indicator_params: IndicatorParams, params: FuturesParams) -> Self {
        Self {
            base: StandardIndicators::new(indicator_params),
            params,
        }
    }
}

impl Default for FuturesIndicators<StandardIndicators> {
    fn default() -> Self {
        Self::new(IndicatorParams::default(), FuturesParams::default())
    }
}

impl<B: BaseIndicators> FuturesIndicators<B> {
    pub fn with_base(base: B, params: FuturesParams) -> Self {
        Self { base, params }
    }

    pub fn params(&self) -> &FuturesParams {
        &self.params
    }

    /// Reject zero periods (and a volatility window too short for a sample
    /// deviation) before any computation runs.
    fn validate(&self) -> Result<(), DeriveError> {
        let p = &self.params;
        let futures_periods = [
            ("basis_ma_period", p.basis_ma_period),
            ("open_interest_ma_period", p.open_interest_ma_period),
            ("momentum_period", p.momentum_period),
        ];
        for (name, value) in self.base.params().periods().into_iter().chain(futures_periods) {
            if value == 0 {
                return Err(DeriveError::InvalidPeriod { name, value });
            }
        }
        if p.volatility_period < 3 {
            return Err(DeriveError::InvalidPeriod {
                name: "volatility_period",
                value: p.volatility_period,
            });
        }
        Ok(())
    }

    /// Compute the full indicator frame for `bars`.
    pub fn extend(&self, bars: &BarSeries) -> Result<IndicatorFrame, DeriveError> {
        if bars.is_empty() {
            return Err(DeriveError::EmptySeries);
        }
        self.validate()?;

        let mut frame = self.base.compute(bars);
        if frame.len() != bars.len() {
            return Err(DeriveError::RowMismatch {
                expected: bars.len(),
                actual: frame.len(),
            });
        }

        let n = bars.len();
        let columns = bars.columns();
        let closes = bars.closes();
        let volumes = bars.volumes();
        let open_interest = bars.open_interests();

        let (oi_change, oi_ma) = if columns.open_interest {
            (
                open_interest_change(&open_interest),
                rolling_mean(&open_interest, self.params.open_interest_ma_period),
            )
        } else {
            warn!("OpenInterest column absent, OI_Change / OI_MA omitted");
            (vec![None; n], vec![None; n])
        };

        let oi_volume = if columns.open_interest && columns.volume {
            open_interest_volume_ratio(&open_interest, &volumes)
        } else {
            warn!("OpenInterest or Volume column absent, OI_Volume_Ratio omitted");
            vec![None; n]
        };

        let pvt = if columns.volume {
            price_volume_trend(&closes, &volumes)
        } else {
            warn!("Volume column absent, PVT omitted");
            vec![None; n]
        };

        let momentum = momentum(&closes, self.params.momentum_period);
        let log_returns = log_returns(&closes);
        let volatility = annualized_volatility(&log_returns, self.params.volatility_period);

        for (i, row) in frame.rows_mut().iter_mut().enumerate() {
            row.oi_change = oi_change[i];
            row.oi_ma = oi_ma[i];
            row.oi_volume_ratio = oi_volume[i];
            row.momentum = momentum[i];
            row.pvt = pvt[i];
            row.log_returns = log_returns[i];
            row.volatility_std = volatility[i];
        }

        debug!(rows = n, "futures indicators derived");
        Ok(frame)
    }
}

// =============================================================================
// Column derivations
// =============================================================================

/// Percentage change of open interest against the previous row.
pub fn open_interest_change(open_interest: &[f64]) -> Series {
    let mut out = vec![None; open_interest.len()];
    for i in 1..open_interest.len() {
        let prev = open_interest[i - 1];
        out[i] = finite((open_interest[i] - prev) / prev * 100.0);
    }
    out
}

/// Open interest over volume; zero volume yields an undefined row.
pub fn open_interest_volume_ratio(open_interest: &[f64], volumes: &[f64]) -> Series {
    open_interest
        .iter()
        .zip(volumes)
        .map(|(&oi, &vol)| if vol == 0.0 { None } else { finite(oi / vol) })
        .collect()
}

/// `Close_t - Close_{t-period}`.
pub fn momentum(closes: &[f64], period: usize) -> Series {
    let mut out = vec![None; closes.len()];
    for i in period..closes.len() {
        out[i] = finite(closes[i] - closes[i - period]);
    }
    out
}

/// Cumulative price-volume trend.
///
/// Row 0 has no prior close and is undefined.  A row whose term is
/// non-finite is undefined and contributes nothing to the running total.
pub fn price_volume_trend(closes: &[f64], volumes: &[f64]) -> Series {
    let mut out = vec![None; closes.len()];
    let mut total = 0.0;
    for i in 1..closes.len() {
        let pct = (closes[i] - closes[i - 1]) / closes[i - 1];
        if let Some(term) = finite(pct * volumes[i]) {
            total += term;
            out[i] = Some(total);
        }
    }
    out
}

/// `ln(Close_t / Close_{t-1})`; undefined at row 0.
pub fn log_returns(closes: &[f64]) -> Series {
    let mut out = vec![None; closes.len()];
    for i in 1..closes.len() {
        out[i] = finite((closes[i] / closes[i - 1]).ln());
    }
    out
}

/// Annualised sample volatility of the trailing `period` log returns.
///
/// Row 0 has no return, so the first window (row `period - 1`) holds the
/// `period - 1` returns available; every later row uses a full `period`.
pub fn annualized_volatility(log_returns: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; log_returns.len()];
    if period < 3 {
        return out;
    }
    let scale = TRADING_DAYS_PER_YEAR.sqrt();
    for i in (period - 1)..log_returns.len() {
        let start = (i + 1).saturating_sub(period).max(1);
        let window: Option<Vec<f64>> = log_returns[start..=i].iter().copied().collect();
        out[i] = window
            .and_then(|w| std_dev(&w, StdKind::Sample))
            .and_then(|s| finite(s * scale));
    }
    out
}
