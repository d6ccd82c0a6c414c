// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator implementations.  Every series function
// returns a vector aligned with its input: element `i` describes row `i`, and
// rows without enough history (or with a non-finite result) are `None`.
//
// Two stages build an `IndicatorFrame`:
//   1. `BaseIndicators`: generic columns (MA, MACD, RSI, Bollinger, ATR,
//      Volume MA).
//   2. `FuturesIndicators`: futures-specific columns layered on top.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod futures;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use frame::{BaseIndicators, IndicatorFrame, IndicatorParams, IndicatorRow, StandardIndicators};
pub use futures::{DeriveError, FuturesIndicators, FuturesParams};

/// An indicator column aligned with its source rows.
pub type Series = Vec<Option<f64>>;

/// `Some(x)` when `x` is finite, otherwise `None`.
#[inline]
pub fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}
