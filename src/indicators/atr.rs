// =============================================================================
// Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// The first TR needs a previous close, so the first ATR lands on row `period`.
// Default period: 14
// =============================================================================

use super::Series;
use crate::market_data::Bar;

/// Compute the ATR series aligned with `bars`.
///
/// Rows are undefined when `period` is zero, when there are fewer than
/// `period + 1` bars, or after a non-finite intermediate value.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Series {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period + 1 {
        return out;
    }

    // tr_values[i] describes bars[i + 1].
    let tr_values: Vec<f64> = bars
        .windows(2)
        .map(|w| {
            let (prev_close, high, low) = (w[0].close, w[1].high, w[1].low);
            // f64::max ignores NaN, so a broken input has to be caught here.
            if !(prev_close.is_finite() && high.is_finite() && low.is_finite()) {
                return f64::NAN;
            }
            let hl = high - low;
            let hc = (high - prev_close).abs();
            let lc = (low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let seed: f64 = tr_values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return out;
    }
    out[period] = Some(seed);

    let period_f = period as f64;
    let mut atr = seed;
    for (i, &tr) in tr_values.iter().enumerate().skip(period) {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            break;
        }
        out[i + 1] = Some(atr);
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i);
        Bar {
            date,
            open: close,
            high,
            low,
            close,
            volume: 100.0,
            open_interest: 1000.0,
            amount: 0.0,
        }
    }

    #[test]
    fn atr_insufficient_data() {
        let bars: Vec<Bar> = (0..10).map(|i| bar(i, 105.0, 95.0, 100.0)).collect();
        assert!(calculate_atr(&bars, 14).iter().all(Option::is_none));
    }

    #[test]
    fn atr_first_value_on_row_period() {
        let bars: Vec<Bar> = (0..4).map(|i| bar(i, 105.0, 95.0, 100.0)).collect();
        let atr = calculate_atr(&bars, 3);
        assert_eq!(atr[..3], [None, None, None]);
        assert!((atr[3].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i, base + 5.0, base - 5.0, base)
            })
            .collect();
        let atr = calculate_atr(&bars, 14)[29].unwrap();
        assert!((atr - 10.0).abs() < 1.0, "expected ATR near 10.0, got {atr}");
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        // Gap: |115 - 95| = 20 > 115 - 108 = 7
        let bars = vec![
            bar(0, 105.0, 95.0, 95.0),
            bar(1, 115.0, 108.0, 112.0),
            bar(2, 118.0, 110.0, 115.0),
            bar(3, 120.0, 113.0, 118.0),
        ];
        let atr = calculate_atr(&bars, 3)[3].unwrap();
        assert!(atr > 7.0, "ATR should reflect the gap, got {atr}");
    }

    #[test]
    fn atr_nan_returns_undefined() {
        let mut bars: Vec<Bar> = (0..4).map(|i| bar(i, 105.0, 95.0, 100.0)).collect();
        bars[1].high = f64::NAN;
        assert!(calculate_atr(&bars, 3).iter().all(Option::is_none));
    }
}
