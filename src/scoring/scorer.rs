// =============================================================================
// Futures Scorer: six-factor composite score
// =============================================================================
//
// Every sub-score starts at 50, applies additive adjustments read from the two
// most recent rows, and is clamped to [0, 100].
//
// Rule evaluation:
//   - An undefined input skips its rule entirely, `else` branch included.
//   - With a single row there is no previous observation; "increasing / else"
//     rules contribute nothing and crossovers cannot fire.
//   - A non-finite intermediate from defined inputs (division by zero, NaN
//     price) fails the sub-score, which is then logged and replaced by 50.
//
// Composite:
//   total = Σ subscore_f × weight_f
//   Volume, open interest and basis score 0 when their inputs are absent.
//   final = clamp(round_half_even(total), 0, 100)
// =============================================================================

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::Weights;
use crate::indicators::bollinger::bandwidth;
use crate::indicators::{IndicatorFrame, IndicatorRow};
use crate::market_data::BasisFrame;
use crate::types::{Factor, Recommendation};

const NEUTRAL: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("indicator frame has no rows")]
    EmptyFrame,

    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// Per-factor sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub basis: f64,
}

impl SubScores {
    fn neutral() -> Self {
        Self {
            trend: NEUTRAL,
            momentum: NEUTRAL,
            volatility: NEUTRAL,
            volume: NEUTRAL,
            open_interest: NEUTRAL,
            basis: NEUTRAL,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Trend => self.trend,
            Factor::Momentum => self.momentum,
            Factor::Volatility => self.volatility,
            Factor::Volume => self.volume,
            Factor::OpenInterest => self.open_interest,
            Factor::Basis => self.basis,
        }
    }
}

/// Sub-scores together with the weighted total and the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub sub_scores: SubScores,
    pub total: f64,
    pub score: u8,
    pub recommendation: Recommendation,
}

/// One ranked instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub instrument_id: String,
    pub score: u8,
    pub recommendation: Recommendation,
}

/// The latest row and, when the frame has one, the row before it.
struct Window<'a> {
    latest: &'a IndicatorRow,
    previous: Option<&'a IndicatorRow>,
}

impl<'a> Window<'a> {
    fn of(frame: &'a IndicatorFrame) -> Option<Self> {
        let latest = frame.latest()?;
        Some(Self {
            latest,
            previous: frame.back(1),
        })
    }

    /// Previous row, falling back to the latest for crossover checks.
    fn prev_or_latest(&self) -> &'a IndicatorRow {
        self.previous.unwrap_or(self.latest)
    }
}

fn checked(name: &'static str, x: f64) -> Result<f64, ScoreError> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(ScoreError::NonFinite(name))
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

// =============================================================================
// Scorer
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct FuturesScorer {
    weights: Weights,
}

impl FuturesScorer {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    /// Composite score in [0, 100].
    pub fn score(&self, frame: &IndicatorFrame, basis: Option<&BasisFrame>) -> u8 {
        self.score_breakdown(frame, basis).score
    }

    pub fn recommend(&self, score: u8) -> Recommendation {
        Recommendation::from_score(score)
    }

    /// Score with every intermediate exposed.
    pub fn score_breakdown(&self, frame: &IndicatorFrame, basis: Option<&BasisFrame>) -> ScoreBreakdown {
        let Some(window) = Window::of(frame) else {
            warn!(error = %ScoreError::EmptyFrame, "scoring an empty frame, using neutral score");
            return self.finish(SubScores::neutral(), NEUTRAL);
        };

        let sub = SubScores {
            trend: absorb(Factor::Trend, trend_score(&window)),
            momentum: absorb(Factor::Momentum, momentum_score(frame, &window)),
            volatility: absorb(Factor::Volatility, volatility_score(&window)),
            volume: if frame.has_volume() {
                absorb(Factor::Volume, volume_score(&window))
            } else {
                0.0
            },
            open_interest: if frame.has_open_interest() {
                absorb(Factor::OpenInterest, open_interest_score(&window))
            } else {
                0.0
            },
            basis: match basis {
                Some(b) if !b.is_empty() => absorb(Factor::Basis, basis_score(b)),
                _ => 0.0,
            },
        };

        let total: f64 = Factor::ALL
            .iter()
            .map(|&f| sub.get(f) * self.weights.get(f))
            .sum();

        if !total.is_finite() {
            warn!(total, "composite score is not finite, using neutral score");
            return self.finish(sub, NEUTRAL);
        }
        self.finish(sub, total)
    }

    fn finish(&self, sub_scores: SubScores, total: f64) -> ScoreBreakdown {
        let score = total.round_ties_even().clamp(0.0, 100.0) as u8;
        debug!(
            trend = sub_scores.trend,
            momentum = sub_scores.momentum,
            volatility = sub_scores.volatility,
            volume = sub_scores.volume,
            open_interest = sub_scores.open_interest,
            basis = sub_scores.basis,
            total,
            score,
            "score computed"
        );
        ScoreBreakdown {
            sub_scores,
            total,
            score,
            recommendation: self.recommend(score),
        }
    }

    /// Score each instrument independently and rank by score, descending.
    /// Ties keep their input order.
    pub fn batch_score(
        &self,
        frames: &[(String, IndicatorFrame)],
        basis: Option<&HashMap<String, BasisFrame>>,
    ) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> = frames
            .iter()
            .map(|(id, frame)| {
                let score = self.score(frame, basis.and_then(|m| m.get(id)));
                ScoreResult {
                    instrument_id: id.clone(),
                    score,
                    recommendation: self.recommend(score),
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(instruments = results.len(), "batch scored");
        results
    }
}

fn absorb(factor: Factor, result: Result<f64, ScoreError>) -> f64 {
    result.unwrap_or_else(|e| {
        warn!(factor = %factor, error = %e, "sub-score failed, using neutral");
        NEUTRAL
    })
}

// =============================================================================
// Sub-scores
// =============================================================================

fn trend_score(w: &Window) -> Result<f64, ScoreError> {
    let (l, p) = (w.latest, w.prev_or_latest());
    let close = checked("Close", l.close)?;
    let mut score = NEUTRAL;

    // MA5 / MA20 crossover
    if let (Some(ma5), Some(ma20), Some(p_ma5), Some(p_ma20)) =
        (l.ma_short, l.ma_medium, p.ma_short, p.ma_medium)
    {
        if ma5 > ma20 && p_ma5 <= p_ma20 {
            score += 15.0;
        } else if ma5 < ma20 && p_ma5 >= p_ma20 {
            score -= 15.0;
        }
    }

    // Stacked averages
    if let (Some(ma5), Some(ma20), Some(ma60)) = (l.ma_short, l.ma_medium, l.ma_long) {
        if ma5 > ma20 && ma20 > ma60 {
            score += 10.0;
        } else if ma5 < ma20 && ma20 < ma60 {
            score -= 10.0;
        }
    }

    if let Some(ma20) = l.ma_medium {
        score += if close > ma20 { 5.0 } else { -5.0 };
    }

    // MACD / Signal crossover
    if let (Some(macd), Some(signal), Some(p_macd), Some(p_signal)) =
        (l.macd, l.signal, p.macd, p.signal)
    {
        if macd > signal && p_macd <= p_signal {
            score += 10.0;
        } else if macd < signal && p_macd >= p_signal {
            score -= 10.0;
        }
    }

    if let (Some(hist), Some(p_hist)) = (l.histogram, p.histogram) {
        if hist > 0.0 && hist > p_hist {
            score += 5.0;
        } else if hist < 0.0 && hist < p_hist {
            score -= 5.0;
        }
    }

    Ok(clamp_score(score))
}

fn momentum_score(frame: &IndicatorFrame, w: &Window) -> Result<f64, ScoreError> {
    let l = w.latest;
    let close = checked("Close", l.close)?;
    let mut score = NEUTRAL;

    if let Some(rsi) = l.rsi {
        if rsi > 70.0 {
            score -= 10.0;
        } else if rsi < 30.0 {
            score += 10.0;
        }
        if let Some(p_rsi) = w.previous.and_then(|p| p.rsi) {
            if rsi > p_rsi && rsi < 70.0 {
                score += 5.0;
            } else if rsi < p_rsi && rsi > 30.0 {
                score -= 5.0;
            }
        }
    }

    if let Some(momentum) = l.momentum {
        score += if momentum > 0.0 { 10.0 } else { -10.0 };
        if let Some(p_momentum) = w.previous.and_then(|p| p.momentum) {
            score += if momentum > p_momentum { 5.0 } else { -5.0 };
        }
    }

    // Five-bar price return
    if frame.len() > 5 {
        if let Some(base) = frame.back(5) {
            let base_close = checked("Close", base.close)?;
            let change = checked("5-bar return", (close - base_close) / base_close * 100.0)?;
            if change > 5.0 {
                score += 10.0;
            } else if change > 2.0 {
                score += 5.0;
            } else if change < -5.0 {
                score -= 10.0;
            } else if change < -2.0 {
                score -= 5.0;
            }
        }
    }

    Ok(clamp_score(score))
}

fn volatility_score(w: &Window) -> Result<f64, ScoreError> {
    let l = w.latest;
    let close = checked("Close", l.close)?;
    let mut score = NEUTRAL;

    if let Some(vol) = l.volatility_std {
        if vol > 0.4 {
            score -= 15.0;
        } else if vol > 0.3 {
            score -= 10.0;
        } else if vol > 0.2 {
            score -= 5.0;
        } else if vol < 0.1 {
            score += 5.0;
        }
    }

    if let (Some(upper), Some(middle), Some(lower)) = (l.bb_upper, l.bb_middle, l.bb_lower) {
        let width = bandwidth(upper, middle, lower).ok_or(ScoreError::NonFinite("Bollinger bandwidth"))?;
        score += if width > 0.1 { -10.0 } else { 10.0 };
        if close > upper {
            score -= 5.0;
        } else if close < lower {
            score += 5.0;
        }
    }

    if let Some(atr) = l.atr {
        let atr_pct = checked("ATR percent", atr / close * 100.0)?;
        if atr_pct > 3.0 {
            score -= 10.0;
        } else if atr_pct < 1.0 {
            score += 10.0;
        }
    }

    Ok(clamp_score(score))
}

fn volume_score(w: &Window) -> Result<f64, ScoreError> {
    let l = w.latest;
    let close = checked("Close", l.close)?;
    let volume = checked("Volume", l.volume)?;
    let mut score = NEUTRAL;

    if let Some(p) = w.previous {
        let p_close = checked("Close", p.close)?;
        let p_volume = checked("Volume", p.volume)?;
        let change = checked("volume change", (volume - p_volume) / p_volume * 100.0)?;
        let price_up = close > p_close;
        if price_up && change > 20.0 {
            score += 15.0;
        } else if price_up && change < -20.0 {
            score -= 5.0;
        } else if !price_up && change > 20.0 {
            score -= 15.0;
        } else if !price_up && change < -20.0 {
            score += 5.0;
        }
    }

    if let Some(volume_ma) = l.volume_ma {
        let ratio = checked("volume ratio", volume / volume_ma)?;
        if ratio > 2.0 {
            score += 10.0;
        } else if ratio > 1.5 {
            score += 5.0;
        } else if ratio < 0.5 {
            score -= 10.0;
        } else if ratio < 0.8 {
            score -= 5.0;
        }
    }

    if let (Some(pvt), Some(p)) = (l.pvt, w.previous) {
        if let Some(p_pvt) = p.pvt {
            let p_close = p.close;
            if pvt > p_pvt && close > p_close {
                score += 10.0;
            } else if pvt < p_pvt && close < p_close {
                score -= 10.0;
            } else if pvt > p_pvt && close < p_close {
                score += 5.0;
            } else if pvt < p_pvt && close > p_close {
                score -= 5.0;
            }
        }
    }

    Ok(clamp_score(score))
}

fn open_interest_score(w: &Window) -> Result<f64, ScoreError> {
    let l = w.latest;
    let close = checked("Close", l.close)?;
    let oi = checked("OpenInterest", l.open_interest)?;
    let mut score = NEUTRAL;

    if let Some(p) = w.previous {
        let p_close = checked("Close", p.close)?;
        let p_oi = checked("OpenInterest", p.open_interest)?;
        let change = checked("open interest change", (oi - p_oi) / p_oi * 100.0)?;
        let price_up = close > p_close;
        if price_up && change > 5.0 {
            score += 15.0;
        } else if price_up && change < -5.0 {
            score -= 5.0;
        } else if !price_up && change > 5.0 {
            score -= 15.0;
        } else if !price_up && change < -5.0 {
            score += 5.0;
        }
    }

    if let Some(oi_ma) = l.oi_ma {
        let ratio = checked("open interest ratio", oi / oi_ma)?;
        if ratio > 1.2 {
            score += 10.0;
        } else if ratio > 1.1 {
            score += 5.0;
        } else if ratio < 0.8 {
            score -= 10.0;
        } else if ratio < 0.9 {
            score -= 5.0;
        }
    }

    if let Some(ratio) = l.oi_volume_ratio {
        if ratio > 10.0 {
            score += 5.0;
        } else if ratio < 2.0 {
            score -= 5.0;
        }
    }

    Ok(clamp_score(score))
}

fn basis_score(basis: &BasisFrame) -> Result<f64, ScoreError> {
    let l = basis.latest().ok_or(ScoreError::EmptyFrame)?;
    let previous = basis.previous();
    let mut score = NEUTRAL;

    if let Some(b) = l.basis {
        score += if b > 0.0 { 5.0 } else { -5.0 };
        if let Some(p_b) = previous.and_then(|p| p.basis) {
            score += if b - p_b > 0.0 { 5.0 } else { -5.0 };
        }
    }

    if let Some(ratio) = l.basis_ratio {
        if ratio > 5.0 {
            score += 10.0;
        } else if ratio < -5.0 {
            score -= 10.0;
        }
    }

    if let Some(z) = l.spread_z_score {
        if z > 2.0 {
            score -= 15.0;
        } else if z < -2.0 {
            score += 15.0;
        }
    }

    Ok(clamp_score(score))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::FuturesIndicators;
    use crate::market_data::{Bar, BarSeries, ColumnSet};
    use chrono::NaiveDate;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn series(n: usize, mut f: impl FnMut(usize) -> (f64, f64, f64)) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let (close, volume, oi) = f(i);
                Bar {
                    date: day(i),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume,
                    open_interest: oi,
                    amount: 0.0,
                }
            })
            .collect();
        BarSeries::new(bars, ColumnSet::ALL).unwrap()
    }

    /// A frame of `n` rows with no indicators, edited row by row.
    fn raw_frame(n: usize, mut edit: impl FnMut(usize, &mut IndicatorRow)) -> IndicatorFrame {
        let bars = series(n, |_| (100.0, 1000.0, 5000.0));
        let mut frame = IndicatorFrame::from_bars(&bars);
        for (i, row) in frame.rows_mut().iter_mut().enumerate() {
            edit(i, row);
        }
        frame
    }

    fn uptrend() -> IndicatorFrame {
        let bars = series(60, |i| {
            let t = i as f64;
            (
                100.0 + 0.5 * t + 0.01 * t * t,
                1.25f64.powi(i as i32),
                1.0e6 * 1.06f64.powi(i as i32),
            )
        });
        FuturesIndicators::default().extend(&bars).unwrap()
    }

    #[test]
    fn clean_uptrend_scores_bullish() {
        let breakdown = FuturesScorer::default().score_breakdown(&uptrend(), None);
        assert!(breakdown.sub_scores.trend > 50.0, "trend {}", breakdown.sub_scores.trend);
        assert_eq!(breakdown.sub_scores.basis, 0.0);
        assert!(
            matches!(
                breakdown.recommendation,
                Recommendation::Hold | Recommendation::Buy | Recommendation::StrongBuy
            ),
            "got {:?} at {}",
            breakdown.recommendation,
            breakdown.score
        );
    }

    #[test]
    fn flat_volume_uptrend_scores_hold_or_better() {
        // Gentle trend with a swing on top; volume and open interest flat.
        let bars = series(60, |i| {
            let t = i as f64;
            (100.0 + 0.25 * t + 1.5 * (1.3 * t).sin(), 1000.0, 5000.0)
        });
        let frame = FuturesIndicators::default().extend(&bars).unwrap();
        let rsi = frame.latest().unwrap().rsi.unwrap();
        assert!((40.0..70.0).contains(&rsi), "rsi {rsi}");

        let b = FuturesScorer::default().score_breakdown(&frame, None);
        assert!(b.sub_scores.trend > 50.0, "trend {}", b.sub_scores.trend);
        assert!(b.score >= 55, "score {}", b.score);
        assert!(matches!(
            b.recommendation,
            Recommendation::Hold | Recommendation::Buy | Recommendation::StrongBuy
        ));
    }

    #[test]
    fn score_is_idempotent() {
        let scorer = FuturesScorer::default();
        let frame = uptrend();
        assert_eq!(scorer.score(&frame, None), scorer.score(&frame, None));
    }

    #[test]
    fn adversarial_inputs_stay_in_range() {
        let scorer = FuturesScorer::default();
        let cases: Vec<Box<dyn Fn(usize) -> (f64, f64, f64)>> = vec![
            Box::new(|i| (if i == 30 { f64::NAN } else { 100.0 }, 10.0, 10.0)),
            Box::new(|i| (100.0 + i as f64, if i % 2 == 0 { 0.0 } else { 1e12 }, 0.0)),
            Box::new(|i| (if i == 39 { f64::INFINITY } else { 50.0 }, f64::NAN, 1.0)),
            Box::new(|_| (0.0, 0.0, 0.0)),
            Box::new(|i| (1e-300 * (i + 1) as f64, 1e308, -1.0)),
            Box::new(|i| (if i % 3 == 0 { -100.0 } else { 100.0 }, 5.0, 5.0)),
        ];
        for (k, case) in cases.iter().enumerate() {
            for n in [2, 6, 40] {
                let frame = FuturesIndicators::default().extend(&series(n, case)).unwrap();
                let b = scorer.score_breakdown(&frame, None);
                assert!(b.score <= 100, "case {k} n {n}");
                for f in Factor::ALL {
                    let s = b.sub_scores.get(f);
                    assert!((0.0..=100.0).contains(&s), "case {k} n {n} {f} = {s}");
                }
            }
        }
    }

    #[test]
    fn batch_ranks_descending_and_stable() {
        let scorer = FuturesScorer::default();
        let flat = FuturesIndicators::default()
            .extend(&series(30, |_| (100.0, 100.0, 100.0)))
            .unwrap();
        let frames = vec![
            ("A".to_string(), flat.clone()),
            ("UP".to_string(), uptrend()),
            ("B".to_string(), flat.clone()),
            ("C".to_string(), flat),
        ];
        let ranked = scorer.batch_score(&frames, None);
        let ids: Vec<&str> = ranked.iter().map(|r| r.instrument_id.as_str()).collect();
        assert_eq!(ids, vec!["UP", "A", "B", "C"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn single_row_never_fails() {
        let frame = FuturesIndicators::default()
            .extend(&series(1, |_| (100.0, 10.0, 10.0)))
            .unwrap();
        let b = FuturesScorer::default().score_breakdown(&frame, None);
        assert_eq!(b.sub_scores.trend, 50.0);
        assert_eq!(b.sub_scores.momentum, 50.0);
        assert_eq!(b.sub_scores.volume, 50.0);
        assert_eq!(b.sub_scores.open_interest, 50.0);
    }

    #[test]
    fn golden_cross_with_close_above_ma20() {
        let frame = raw_frame(2, |i, row| {
            row.close = 12.0;
            row.ma_medium = Some(10.0);
            row.ma_short = Some(if i == 0 { 10.0 } else { 11.0 });
        });
        let w = Window::of(&frame).unwrap();
        // +15 crossover, +5 close above MA20, no MA60 so no stacking rule
        assert_eq!(trend_score(&w), Ok(70.0));
    }

    #[test]
    fn momentum_without_previous_skips_change_rule() {
        let frame = raw_frame(1, |_, row| row.momentum = Some(3.0));
        let w = Window::of(&frame).unwrap();
        assert_eq!(momentum_score(&frame, &w), Ok(60.0));

        let frame = raw_frame(2, |_, row| row.momentum = Some(3.0));
        let w = Window::of(&frame).unwrap();
        // Equal momentum counts as not increasing.
        assert_eq!(momentum_score(&frame, &w), Ok(55.0));
    }

    #[test]
    fn zero_previous_volume_fails_sub_score() {
        let frame = raw_frame(2, |i, row| row.volume = if i == 0 { 0.0 } else { 10.0 });
        let w = Window::of(&frame).unwrap();
        assert_eq!(volume_score(&w), Err(ScoreError::NonFinite("volume change")));
        assert_eq!(FuturesScorer::default().score_breakdown(&frame, None).sub_scores.volume, 50.0);
    }

    #[test]
    fn zero_close_fails_volatility() {
        let frame = raw_frame(1, |_, row| {
            row.close = 0.0;
            row.atr = Some(1.0);
        });
        let w = Window::of(&frame).unwrap();
        assert_eq!(volatility_score(&w), Err(ScoreError::NonFinite("ATR percent")));
    }

    #[test]
    fn missing_columns_contribute_zero() {
        let bars = BarSeries::new(
            (0..10).map(|i| Bar::from_close(day(i), 100.0)).collect(),
            ColumnSet::CLOSE_ONLY,
        )
        .unwrap();
        let frame = FuturesIndicators::default().extend(&bars).unwrap();
        let b = FuturesScorer::default().score_breakdown(&frame, Some(&BasisFrame::default()));
        assert_eq!(b.sub_scores.volume, 0.0);
        assert_eq!(b.sub_scores.open_interest, 0.0);
        assert_eq!(b.sub_scores.basis, 0.0);
    }

    #[test]
    fn basis_rules() {
        let fut = BarSeries::new(
            vec![Bar::from_close(day(0), 110.0), Bar::from_close(day(1), 112.0)],
            ColumnSet::CLOSE_ONLY,
        )
        .unwrap();
        let spot = BarSeries::new(
            vec![Bar::from_close(day(0), 100.0), Bar::from_close(day(1), 100.0)],
            ColumnSet::CLOSE_ONLY,
        )
        .unwrap();
        // Basis 12 > 0: +5, rising: +5, ratio 12% > 5: +10
        assert_eq!(basis_score(&BasisFrame::build(&fut, &spot)), Ok(70.0));
    }

    #[test]
    fn empty_frame_is_neutral() {
        let bars = BarSeries::new(Vec::new(), ColumnSet::ALL).unwrap();
        let frame = IndicatorFrame::from_bars(&bars);
        assert_eq!(FuturesScorer::default().score(&frame, None), 50);
    }

    #[test]
    fn rounding_is_half_even() {
        let weights = Weights {
            trend: 0.45,
            momentum: 0.0,
            volatility: 0.0,
            volume: 0.0,
            open_interest: 0.0,
            basis: 0.0,
        };
        // Single flat row: trend 50 * 0.45 = 22.5 -> 22
        let frame = raw_frame(1, |_, _| {});
        let b = FuturesScorer::new(weights).score_breakdown(&frame, None);
        assert_eq!(b.total, 22.5);
        assert_eq!(b.score, 22);
    }
}
