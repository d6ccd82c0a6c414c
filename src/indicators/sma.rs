// =============================================================================
// Simple Moving Average / Rolling Standard Deviation
// =============================================================================
//
// Trailing windows of exactly `period` samples, current row included.  The
// first `period - 1` rows are undefined.  A window containing an undefined or
// non-finite sample yields `None` for that row.

use super::{finite, Series};

/// Degrees-of-freedom correction for [`rolling_std`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdKind {
    /// Divide by `n` (Bollinger Bands).
    Population,
    /// Divide by `n - 1` (volatility, spread z-score).
    Sample,
}

/// Trailing simple moving average over a dense slice.
pub fn rolling_mean(values: &[f64], period: usize) -> Series {
    let opt: Series = values.iter().map(|&v| Some(v)).collect();
    rolling_mean_opt(&opt, period)
}

/// Trailing simple moving average over a series with gaps.
pub fn rolling_mean_opt(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out[i] = sum.and_then(|s| finite(s / period as f64));
    }
    out
}

/// Trailing standard deviation over a series with gaps.
///
/// Sample deviation needs at least two samples; a one-sample window is
/// undefined.
pub fn rolling_std(values: &[Option<f64>], period: usize, kind: StdKind) -> Series {
    let mut out = vec![None; values.len()];
    let min_samples = match kind {
        StdKind::Population => 1,
        StdKind::Sample => 2,
    };
    if period < min_samples {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window: Option<Vec<f64>> = values[i + 1 - period..=i].iter().copied().collect();
        out[i] = window.and_then(|w| std_dev(&w, kind));
    }
    out
}

/// Standard deviation of a dense window.
pub fn std_dev(window: &[f64], kind: StdKind) -> Option<f64> {
    let n = window.len();
    let divisor = match kind {
        StdKind::Population if n >= 1 => n as f64,
        StdKind::Sample if n >= 2 => (n - 1) as f64,
        _ => return None,
    };
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / divisor;
    finite(variance.sqrt())
}
