// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the SMA of the first `period` values, so
// the series is undefined for the first `period - 1` rows.
// =============================================================================

use super::Series;

/// Compute the EMA of a dense slice, aligned with the input.
///
/// # Edge cases
/// - `period == 0` or `values.len() < period` => every row undefined
/// - A non-finite intermediate stops the series; later rows stay undefined,
///   downstream consumers should not trust a broken series.
pub fn calculate_ema(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    let sma: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !sma.is_finite() {
        return out;
    }
    out[period - 1] = Some(sma);

    let mut prev_ema = sma;
    for (i, &value) in values.iter().enumerate().skip(period) {
        let ema = value * multiplier + prev_ema * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        out[i] = Some(ema);
        prev_ema = ema;
    }

    out
}

/// Compute the EMA of a series whose leading rows may be undefined.
///
/// The EMA starts at the first defined row and runs over the contiguous
/// defined run that follows it (MACD signal line over the MACD series).
pub fn calculate_ema_opt(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };
    let run: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    for (offset, ema) in calculate_ema(&run, period).into_iter().enumerate() {
        out[start + offset] = ema;
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn ema_insufficient_data() {
        assert!(calculate_ema(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn ema_period_equals_length() {
        let ema = calculate_ema(&[2.0, 4.0, 6.0], 3);
        assert_eq!(ema[..2], [None, None]);
        // Seed is the SMA = (2+4+6)/3 = 4.0
        assert!((ema[2].unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn ema_known_values() {
        // 5-period EMA of 1..=10: seed 3.0, multiplier 1/3
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&closes, 5);
        assert_eq!(ema.iter().filter(|v| v.is_some()).count(), 6);

        let mult = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((ema[4].unwrap() - expected).abs() < 1e-10);
        for i in 5..10 {
            expected = closes[i] * mult + expected * (1.0 - mult);
            assert!((ema[i].unwrap() - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn ema_stops_at_nan() {
        let ema = calculate_ema(&[1.0, 2.0, 3.0, f64::NAN, 5.0], 3);
        assert_eq!(ema, vec![None, None, Some(2.0), None, None]);
    }

    #[test]
    fn ema_opt_skips_leading_gap() {
        let values = vec![None, None, Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let ema = calculate_ema_opt(&values, 3);
        assert_eq!(ema[..4], [None, None, None, None]);
        assert!((ema[4].unwrap() - 4.0).abs() < 1e-10);
        // 8 * 0.5 + 4 * 0.5
        assert!((ema[5].unwrap() - 6.0).abs() < 1e-10);
    }
}
