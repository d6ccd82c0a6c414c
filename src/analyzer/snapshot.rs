// =============================================================================
// Snapshot: display labels for the latest row of a frame
// =============================================================================
//
//   ma_trend             UP if MA5 > MA20 > MA60, DOWN if MA5 < MA20 < MA60
//   short_trend          UP / DOWN from MA5 against MA20 (batch rows)
//   macd_signal          BUY / SELL / HOLD from MACD against Signal
//   volume_status        HIGH above 1.5× Volume_MA, LOW below 0.5×
//   open_interest_status HIGH above 1.2× OI_MA, LOW below 0.8×
//
// Undefined inputs give the neutral label (FLAT, HOLD, NORMAL).

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaTrend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MacdSignal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolumeStatus {
    High,
    Low,
    Normal,
}

impl VolumeStatus {
    fn classify(value: f64, average: Option<f64>, high: f64, low: f64) -> Self {
        match average {
            Some(avg) if value > avg * high => Self::High,
            Some(avg) if value < avg * low => Self::Low,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub price_change_value: f64,
    pub change_percent: f64,
    pub ma_trend: MaTrend,
    pub short_trend: MaTrend,
    pub rsi: Option<f64>,
    pub macd_signal: MacdSignal,
    pub volume_status: VolumeStatus,
    pub open_interest: Option<f64>,
    pub open_interest_status: VolumeStatus,
    pub volatility: Option<f64>,
}

impl Snapshot {
    /// Labels for the latest row; `None` for an empty frame.
    pub fn of(frame: &IndicatorFrame) -> Option<Self> {
        let l = frame.latest()?;
        let p = frame.previous()?;

        let price_change_value = l.close - p.close;
        let change_percent = if p.close != 0.0 {
            price_change_value / p.close * 100.0
        } else {
            0.0
        };

        let ma_trend = match (l.ma_short, l.ma_medium, l.ma_long) {
            (Some(s), Some(m), Some(lg)) if s > m && m > lg => MaTrend::Up,
            (Some(s), Some(m), Some(lg)) if s < m && m < lg => MaTrend::Down,
            _ => MaTrend::Flat,
        };

        let short_trend = match (l.ma_short, l.ma_medium) {
            (Some(s), Some(m)) if s > m => MaTrend::Up,
            (Some(_), Some(_)) => MaTrend::Down,
            _ => MaTrend::Flat,
        };

        let macd_signal = match (l.macd, l.signal) {
            (Some(m), Some(s)) if m > s => MacdSignal::Buy,
            (Some(m), Some(s)) if m < s => MacdSignal::Sell,
            _ => MacdSignal::Hold,
        };

        let volume_status = if frame.has_volume() {
            VolumeStatus::classify(l.volume, l.volume_ma, 1.5, 0.5)
        } else {
            VolumeStatus::Normal
        };

        let (open_interest, open_interest_status) = if frame.has_open_interest() {
            (
                Some(l.open_interest),
                VolumeStatus::classify(l.open_interest, l.oi_ma, 1.2, 0.8),
            )
        } else {
            (None, VolumeStatus::Normal)
        };

        Some(Self {
            date: l.date,
            price: l.close,
            price_change_value,
            change_percent,
            ma_trend,
            short_trend,
            rsi: l.rsi,
            macd_signal,
            volume_status,
            open_interest,
            open_interest_status,
            volatility: l.volatility_std,
        })
    }
}
