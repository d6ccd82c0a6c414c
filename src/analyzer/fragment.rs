// =============================================================================
// Result Fragments: the JSON objects streamed to the caller
// =============================================================================
//
// Each fragment serialises to one flat JSON object.  The enum is untagged;
// consumers tell fragments apart by their fields (`error`, `status`,
// `ai_analysis_chunk`, `stream_type`, `scan_completed`), matching the wire format the
// frontend already understands.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use super::snapshot::{MaTrend, MacdSignal, Snapshot, VolumeStatus};
use crate::scoring::{ScoreBreakdown, SubScores};
use crate::types::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Error,
    Waiting,
    Completed,
    Analyzing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub futures_code: Option<String>,
    pub error: String,
    pub status: Status,
}

/// Full single-instrument result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFragment {
    pub futures_code: String,
    pub analysis_date: NaiveDate,
    pub score: u8,
    pub price: f64,
    pub price_change_value: f64,
    pub change_percent: f64,
    pub ma_trend: MaTrend,
    pub rsi: Option<f64>,
    pub macd_signal: MacdSignal,
    pub volume_status: VolumeStatus,
    pub open_interest: Option<f64>,
    pub open_interest_status: VolumeStatus,
    pub volatility: Option<f64>,
    pub recommendation: Recommendation,
    pub sub_scores: SubScores,
}

/// One ranked row of a batch scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFragment {
    pub futures_code: String,
    pub score: u8,
    pub recommendation: Recommendation,
    pub price: f64,
    pub price_change_value: f64,
    pub change_percent: f64,
    pub rsi: Option<f64>,
    pub ma_trend: MaTrend,
    pub macd_signal: MacdSignal,
    pub volume_status: VolumeStatus,
    pub open_interest: Option<f64>,
    pub volatility: Option<f64>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzingFragment {
    pub futures_code: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeFragment {
    pub futures_code: String,
    pub ai_analysis_chunk: String,
}

/// Opening fragment of a batch scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanStart {
    pub stream_type: &'static str,
    pub futures_codes: Vec<String>,
    pub min_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub scan_completed: bool,
    pub total_scanned: usize,
    pub total_matched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fragment {
    Error(ErrorFragment),
    Analysis(Box<AnalysisFragment>),
    Ranked(Box<RankedFragment>),
    Analyzing(AnalyzingFragment),
    Narrative(NarrativeFragment),
    ScanStart(ScanStart),
    ScanSummary(ScanSummary),
}

impl Fragment {
    pub fn error(futures_code: Option<&str>, error: impl Into<String>) -> Self {
        Self::Error(ErrorFragment {
            futures_code: futures_code.map(str::to_string),
            error: error.into(),
            status: Status::Error,
        })
    }

    pub fn analysis(code: &str, snapshot: &Snapshot, breakdown: &ScoreBreakdown) -> Self {
        Self::Analysis(Box::new(AnalysisFragment {
            futures_code: code.to_string(),
            analysis_date: snapshot.date,
            score: breakdown.score,
            price: snapshot.price,
            price_change_value: snapshot.price_change_value,
            change_percent: snapshot.change_percent,
            ma_trend: snapshot.ma_trend,
            rsi: snapshot.rsi,
            macd_signal: snapshot.macd_signal,
            volume_status: snapshot.volume_status,
            open_interest: snapshot.open_interest,
            open_interest_status: snapshot.open_interest_status,
            volatility: snapshot.volatility,
            recommendation: breakdown.recommendation,
            sub_scores: breakdown.sub_scores,
        }))
    }

    /// Batch row; `status` is `waiting` when the score passes the filter.
    pub fn ranked(
        code: &str,
        snapshot: &Snapshot,
        score: u8,
        recommendation: Recommendation,
        min_score: u8,
    ) -> Self {
        Self::Ranked(Box::new(RankedFragment {
            futures_code: code.to_string(),
            score,
            recommendation,
            price: snapshot.price,
            price_change_value: snapshot.price_change_value,
            change_percent: snapshot.change_percent,
            rsi: snapshot.rsi,
            ma_trend: snapshot.short_trend,
            macd_signal: snapshot.macd_signal,
            volume_status: snapshot.volume_status,
            open_interest: snapshot.open_interest,
            volatility: snapshot.volatility,
            status: if score >= min_score {
                Status::Waiting
            } else {
                Status::Completed
            },
        }))
    }

    pub fn analyzing(code: &str) -> Self {
        Self::Analyzing(AnalyzingFragment {
            futures_code: code.to_string(),
            status: Status::Analyzing,
        })
    }

    pub fn narrative(code: &str, chunk: String) -> Self {
        Self::Narrative(NarrativeFragment {
            futures_code: code.to_string(),
            ai_analysis_chunk: chunk,
        })
    }

    pub fn scan_start(codes: &[String], min_score: u8) -> Self {
        Self::ScanStart(ScanStart {
            stream_type: "batch",
            futures_codes: codes.to_vec(),
            min_score,
        })
    }

    pub fn scan_summary(total_scanned: usize, total_matched: usize) -> Self {
        Self::ScanSummary(ScanSummary {
            scan_completed: true,
            total_scanned,
            total_matched,
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
