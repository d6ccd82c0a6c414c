// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA(period), upper / lower = middle ± k·σ with σ the
// population standard deviation of the same window.  Default 20 periods at
// 2 standard deviations.

use super::sma::{rolling_mean, rolling_std, StdKind};
use super::{finite, Series};

/// Aligned Bollinger Band columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Calculate Bollinger Bands for every row of `closes`.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let middle = rolling_mean(closes, period);
    let dense: Series = closes.iter().map(|&c| Some(c)).collect();
    let sigma = rolling_std(&dense, period, StdKind::Population);

    let band = |sign: f64| -> Series {
        middle
            .iter()
            .zip(&sigma)
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => finite(m + sign * num_std * s),
                _ => None,
            })
            .collect()
    };

    BollingerSeries {
        upper: band(1.0),
        lower: band(-1.0),
        middle,
    }
}

/// Band width relative to the middle band: `(upper - lower) / middle`.
///
/// `None` when the middle band is zero or any input is non-finite.
pub fn bandwidth(upper: f64, middle: f64, lower: f64) -> Option<f64> {
    if middle == 0.0 {
        return None;
    }
    finite((upper - lower) / middle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0);
        assert!(bb.upper[18].is_none());
        let (u, m, l) = (bb.upper[19].unwrap(), bb.middle[19].unwrap(), bb.lower[19].unwrap());
        assert!(u > m && l < m);
        assert!((m - 10.5).abs() < 1e-10);
        assert!(bandwidth(u, m, l).unwrap() > 0.0);
    }

    #[test]
    fn bollinger_flat() {
        let bb = calculate_bollinger(&[100.0; 20], 20, 2.0);
        let (u, m, l) = (bb.upper[19].unwrap(), bb.middle[19].unwrap(), bb.lower[19].unwrap());
        assert!(bandwidth(u, m, l).unwrap().abs() < 1e-10);
    }

    #[test]
    fn bandwidth_zero_middle_is_undefined() {
        assert!(bandwidth(1.0, 0.0, -1.0).is_none());
    }
}
