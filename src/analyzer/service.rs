// =============================================================================
// Analyzer Service: single-instrument analysis and batch scans
// =============================================================================
//
// Orchestrates data source → indicator extension → scorer → narrator and
// streams `Fragment`s into an mpsc channel.  Fragment order is part of the
// contract; every send is a suspension point.  A closed receiver stops the
// flow with `StreamClosed`.
//
// Single instrument:
//   fetch ─► derive ─► score ─► analysis fragment ─► narrative fragments
//   A fetch or derivation failure emits one error fragment and ends the flow.
//
// Batch scan:
//   scan start ─► fetch all (bounded) ─► derive each ─► score all ─► ranked fragments
//   ─► top-K with score ≥ min_score: analyzing marker + narrative ─► summary
//   Per-instrument failures emit an error fragment; the rest carry on.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::fragment::Fragment;
use super::narrative::{NarrativeError, NarrativeGenerator};
use super::snapshot::Snapshot;
use super::source::{fetch_many, DataSource};
use crate::indicators::{FuturesIndicators, IndicatorFrame};
use crate::market_data::{BarSeries, BasisFrame};
use crate::scoring::FuturesScorer;

/// Narrative chunks buffered between the narrator and the fragment stream.
const NARRATIVE_BUFFER: usize = 32;

#[derive(Debug, Error, PartialEq)]
#[error("fragment receiver closed")]
pub struct StreamClosed;

/// Run-time knobs for the analyzer flows.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOptions {
    pub max_concurrency: usize,
    pub top_k: usize,
    pub min_score: u8,
    pub streaming: bool,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            top_k: 5,
            min_score: 0,
            streaming: true,
            start: None,
            end: None,
        }
    }
}

/// Optional companion instruments for the basis factor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasisCodes {
    /// Spot series; required for any basis data.
    pub spot: Option<String>,
    /// Far-month contract for the calendar-spread z-score.
    pub far: Option<String>,
}

pub struct AnalyzerService {
    source: Arc<dyn DataSource>,
    indicators: FuturesIndicators,
    scorer: FuturesScorer,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
    options: AnalyzerOptions,
}

async fn emit(out: &mpsc::Sender<Fragment>, fragment: Fragment) -> Result<(), StreamClosed> {
    out.send(fragment).await.map_err(|_| StreamClosed)
}

impl AnalyzerService {
    pub fn new(source: Arc<dyn DataSource>, indicators: FuturesIndicators, scorer: FuturesScorer) -> Self {
        Self {
            source,
            indicators,
            scorer,
            narrator: None,
            options: AnalyzerOptions::default(),
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    // -------------------------------------------------------------------------
    // Single instrument
    // -------------------------------------------------------------------------

    pub async fn analyze(
        &self,
        code: &str,
        basis_codes: &BasisCodes,
        out: &mpsc::Sender<Fragment>,
    ) -> Result<(), StreamClosed> {
        info!(futures_code = %code, "analysis started");

        let bars = match self.source.fetch(code, self.options.start, self.options.end).await {
            Ok(bars) if !bars.is_empty() => bars,
            Ok(_) => {
                error!(futures_code = %code, "no bars returned");
                return emit(out, Fragment::error(Some(code), format!("no data for {code}"))).await;
            }
            Err(e) => {
                error!(futures_code = %code, error = %e, "fetch failed");
                return emit(out, Fragment::error(Some(code), format!("failed to fetch {code}: {e}"))).await;
            }
        };

        let frame = match self.indicators.extend(&bars) {
            Ok(frame) => frame,
            Err(e) => {
                error!(futures_code = %code, error = %e, "indicator derivation failed");
                return emit(
                    out,
                    Fragment::error(Some(code), format!("failed to compute indicators for {code}: {e}")),
                )
                .await;
            }
        };

        let basis = self.basis_frame(code, &bars, basis_codes).await;
        let breakdown = self.scorer.score_breakdown(&frame, basis.as_ref());

        let Some(snapshot) = Snapshot::of(&frame) else {
            return emit(out, Fragment::error(Some(code), format!("no data for {code}"))).await;
        };
        info!(
            futures_code = %code,
            score = breakdown.score,
            recommendation = %breakdown.recommendation,
            "analysis scored"
        );
        emit(out, Fragment::analysis(code, &snapshot, &breakdown)).await?;

        self.narrate(code, &frame, out).await?;
        info!(futures_code = %code, "analysis complete");
        Ok(())
    }

    /// Build the basis frame from the spot (and optionally far) series.
    /// Any failure is logged and treated as "no basis data".
    async fn basis_frame(&self, code: &str, bars: &BarSeries, codes: &BasisCodes) -> Option<BasisFrame> {
        let spot_code = match (&codes.spot, &codes.far) {
            (Some(spot), _) => spot,
            (None, Some(_)) => {
                warn!(futures_code = %code, "far contract given without spot, basis skipped");
                return None;
            }
            (None, None) => return None,
        };

        let spot = self.fetch_companion(code, spot_code).await?;
        let mut frame = BasisFrame::build(bars, &spot);

        if let Some(far_code) = &codes.far {
            if let Some(far) = self.fetch_companion(code, far_code).await {
                let window = self.indicators.params().basis_ma_period;
                frame = frame.with_term_structure(bars, &far, window);
            }
        }

        debug!(futures_code = %code, rows = frame.len(), "basis frame ready");
        Some(frame)
    }

    async fn fetch_companion(&self, code: &str, companion: &str) -> Option<BarSeries> {
        match self.source.fetch(companion, self.options.start, self.options.end).await {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => {
                warn!(futures_code = %code, companion, "companion series empty, basis skipped");
                None
            }
            Err(e) => {
                warn!(futures_code = %code, companion, error = %e, "companion fetch failed, basis skipped");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Batch scan
    // -------------------------------------------------------------------------

    pub async fn scan(&self, codes: &[String], out: &mpsc::Sender<Fragment>) -> Result<(), StreamClosed> {
        let opts = &self.options;
        info!(instruments = codes.len(), min_score = opts.min_score, "scan started");
        emit(out, Fragment::scan_start(codes, opts.min_score)).await?;

        let fetched = fetch_many(
            self.source.as_ref(),
            codes,
            opts.start,
            opts.end,
            opts.max_concurrency,
        )
        .await;

        if fetched.is_empty() {
            error!(instruments = codes.len(), "no instrument could be fetched");
            return emit(
                out,
                Fragment::error(None, format!("no data could be fetched for any of {} instruments", codes.len())),
            )
            .await;
        }

        let mut frames: Vec<(String, IndicatorFrame)> = Vec::with_capacity(fetched.len());
        for (code, bars) in fetched {
            match self.indicators.extend(&bars) {
                Ok(frame) => frames.push((code, frame)),
                Err(e) => {
                    error!(futures_code = %code, error = %e, "indicator derivation failed");
                    emit(
                        out,
                        Fragment::error(Some(&code), format!("failed to compute indicators for {code}: {e}")),
                    )
                    .await?;
                }
            }
        }

        let ranked = self.scorer.batch_score(&frames, None);
        let by_code: HashMap<&str, &IndicatorFrame> =
            frames.iter().map(|(code, frame)| (code.as_str(), frame)).collect();

        for result in &ranked {
            let code = result.instrument_id.as_str();
            if let Some(snapshot) = by_code.get(code).and_then(|f| Snapshot::of(f)) {
                emit(
                    out,
                    Fragment::ranked(code, &snapshot, result.score, result.recommendation, opts.min_score),
                )
                .await?;
            }
        }

        let matched: Vec<&str> = ranked
            .iter()
            .filter(|r| r.score >= opts.min_score)
            .map(|r| r.instrument_id.as_str())
            .collect();

        if self.narrator.is_some() {
            for &code in matched.iter().take(opts.top_k) {
                if let Some(frame) = by_code.get(code) {
                    emit(out, Fragment::analyzing(code)).await?;
                    self.narrate(code, frame, out).await?;
                }
            }
        }

        info!(
            scanned = ranked.len(),
            matched = matched.len(),
            "scan complete"
        );
        emit(out, Fragment::scan_summary(ranked.len(), matched.len())).await
    }

    // -------------------------------------------------------------------------
    // Narration
    // -------------------------------------------------------------------------

    /// Forward narrator chunks as fragments while the narrator runs.  A
    /// narrator failure becomes an error fragment; the flow continues.
    async fn narrate(
        &self,
        code: &str,
        frame: &IndicatorFrame,
        out: &mpsc::Sender<Fragment>,
    ) -> Result<(), StreamClosed> {
        let Some(narrator) = &self.narrator else {
            debug!(futures_code = %code, "no narrator configured, narration skipped");
            return Ok(());
        };

        let (tx, mut rx) = mpsc::channel::<String>(NARRATIVE_BUFFER);
        let produce = narrator.narrate(frame, code, self.options.streaming, tx);
        // Owns `rx` so a closed output stream drops it and the narrator sees
        // `SinkClosed` instead of blocking on a full buffer.
        let forward = async move {
            while let Some(chunk) = rx.recv().await {
                emit(out, Fragment::narrative(code, chunk)).await?;
            }
            Ok::<(), StreamClosed>(())
        };

        let (narrated, forwarded) = tokio::join!(produce, forward);
        forwarded?;

        match narrated {
            Ok(()) => Ok(()),
            Err(NarrativeError::SinkClosed) => Err(StreamClosed),
            Err(e) => {
                warn!(futures_code = %code, error = %e, "narration failed");
                emit(out, Fragment::error(Some(code), format!("narrative analysis failed: {e}"))).await
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::fragment::Status;
    use crate::analyzer::source::FetchError;
    use crate::indicators::{FuturesParams, IndicatorParams};
    use crate::market_data::{Bar, ColumnSet};
    use async_trait::async_trait;

    struct MemorySource {
        series: HashMap<String, BarSeries>,
    }

    #[async_trait]
    impl DataSource for MemorySource {
        async fn fetch(
            &self,
            instrument_id: &str,
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<BarSeries, FetchError> {
            self.series
                .get(instrument_id)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(instrument_id.to_string()))
        }
    }

    struct ScriptedNarrator {
        fail: bool,
    }

    #[async_trait]
    impl NarrativeGenerator for ScriptedNarrator {
        async fn narrate(
            &self,
            _frame: &IndicatorFrame,
            instrument_id: &str,
            _streaming: bool,
            out: mpsc::Sender<String>,
        ) -> Result<(), NarrativeError> {
            out.send(format!("{instrument_id} part 1"))
                .await
                .map_err(|_| NarrativeError::SinkClosed)?;
            if self.fail {
                return Err(NarrativeError::Malformed("boom".into()));
            }
            out.send(format!("{instrument_id} part 2"))
                .await
                .map_err(|_| NarrativeError::SinkClosed)
        }
    }

    /// Sends `chunks` narrative pieces, stopping when the sink closes.
    struct ChattyNarrator {
        chunks: usize,
    }

    #[async_trait]
    impl NarrativeGenerator for ChattyNarrator {
        async fn narrate(
            &self,
            _frame: &IndicatorFrame,
            instrument_id: &str,
            _streaming: bool,
            out: mpsc::Sender<String>,
        ) -> Result<(), NarrativeError> {
            for i in 0..self.chunks {
                out.send(format!("{instrument_id} chunk {i}"))
                    .await
                    .map_err(|_| NarrativeError::SinkClosed)?;
            }
            Ok(())
        }
    }

    fn series(n: usize, f: impl Fn(usize) -> f64) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = f(i);
                Bar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1.25f64.powi(i as i32),
                    open_interest: 1.0e6 * 1.06f64.powi(i as i32),
                    amount: 0.0,
                }
            })
            .collect();
        BarSeries::new(bars, ColumnSet::ALL).unwrap()
    }

    fn uptrend() -> BarSeries {
        series(60, |i| {
            let t = i as f64;
            100.0 + 0.5 * t + 0.01 * t * t
        })
    }

    fn downtrend() -> BarSeries {
        series(60, |i| 200.0 - 1.5 * i as f64)
    }

    fn service(narrator: Option<ScriptedNarrator>) -> AnalyzerService {
        let mut map = HashMap::new();
        map.insert("UP".to_string(), uptrend());
        map.insert("DOWN".to_string(), downtrend());
        map.insert("SPOT".to_string(), series(60, |i| 90.0 + 0.5 * i as f64));
        map.insert(
            "EMPTY".to_string(),
            BarSeries::new(Vec::new(), ColumnSet::ALL).unwrap(),
        );
        let svc = AnalyzerService::new(
            Arc::new(MemorySource { series: map }),
            FuturesIndicators::default(),
            FuturesScorer::default(),
        );
        match narrator {
            Some(n) => svc.with_narrator(Arc::new(n)),
            None => svc,
        }
    }

    async fn collect<F, Fut>(run: F) -> (Result<(), StreamClosed>, Vec<Fragment>)
    where
        F: FnOnce(mpsc::Sender<Fragment>) -> Fut,
        Fut: std::future::Future<Output = Result<(), StreamClosed>>,
    {
        let (tx, mut rx) = mpsc::channel(256);
        let result = run(tx).await;
        let mut fragments = Vec::new();
        while let Some(f) = rx.recv().await {
            fragments.push(f);
        }
        (result, fragments)
    }

    fn codes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn analyze_emits_result_then_narrative() {
        let svc = service(Some(ScriptedNarrator { fail: false }));
        let (result, fragments) =
            collect(|tx| async move { svc.analyze("UP", &BasisCodes::default(), &tx).await }).await;
        assert_eq!(result, Ok(()));
        assert_eq!(fragments.len(), 3);
        match &fragments[0] {
            Fragment::Analysis(a) => {
                assert_eq!(a.futures_code, "UP");
                assert_eq!(a.sub_scores.basis, 0.0);
                assert!(a.score >= 55, "score {}", a.score);
            }
            other => panic!("expected analysis, got {other:?}"),
        }
        assert_eq!(fragments[1], Fragment::narrative("UP", "UP part 1".into()));
        assert_eq!(fragments[2], Fragment::narrative("UP", "UP part 2".into()));
    }

    #[tokio::test]
    async fn analyze_without_narrator_emits_only_result() {
        let svc = service(None);
        let (_, fragments) =
            collect(|tx| async move { svc.analyze("DOWN", &BasisCodes::default(), &tx).await }).await;
        assert_eq!(fragments.len(), 1);
        assert!(matches!(fragments[0], Fragment::Analysis(_)));
    }

    #[tokio::test]
    async fn analyze_unknown_or_empty_emits_single_error() {
        for code in ["NOPE", "EMPTY"] {
            let svc = service(Some(ScriptedNarrator { fail: false }));
            let (result, fragments) =
                collect(|tx| async move { svc.analyze(code, &BasisCodes::default(), &tx).await }).await;
            assert_eq!(result, Ok(()));
            assert_eq!(fragments.len(), 1, "{code}");
            assert!(fragments[0].is_error());
        }
    }

    #[tokio::test]
    async fn analyze_derivation_failure_emits_single_error() {
        let mut map = HashMap::new();
        map.insert("UP".to_string(), uptrend());
        let params = FuturesParams {
            volatility_period: 0,
            ..FuturesParams::default()
        };
        let svc = AnalyzerService::new(
            Arc::new(MemorySource { series: map }),
            FuturesIndicators::new(IndicatorParams::default(), params),
            FuturesScorer::default(),
        );
        let (_, fragments) =
            collect(|tx| async move { svc.analyze("UP", &BasisCodes::default(), &tx).await }).await;
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].is_error());
    }

    #[tokio::test]
    async fn narration_failure_is_reported_and_flow_continues() {
        let svc = service(Some(ScriptedNarrator { fail: true }));
        let (result, fragments) =
            collect(|tx| async move { svc.analyze("UP", &BasisCodes::default(), &tx).await }).await;
        assert_eq!(result, Ok(()));
        assert_eq!(fragments.len(), 3);
        assert!(matches!(fragments[0], Fragment::Analysis(_)));
        assert_eq!(fragments[1], Fragment::narrative("UP", "UP part 1".into()));
        assert!(fragments[2].is_error());
    }

    #[tokio::test]
    async fn analyze_with_spot_scores_basis() {
        let svc = service(None);
        let basis = BasisCodes {
            spot: Some("SPOT".into()),
            far: None,
        };
        let (_, fragments) = collect(|tx| async move { svc.analyze("UP", &basis, &tx).await }).await;
        match &fragments[0] {
            Fragment::Analysis(a) => assert!(a.sub_scores.basis > 0.0),
            other => panic!("expected analysis, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_receiver_stops_the_flow() {
        let svc = service(Some(ScriptedNarrator { fail: false }));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        assert_eq!(svc.analyze("UP", &BasisCodes::default(), &tx).await, Err(StreamClosed));
    }

    #[tokio::test]
    async fn receiver_dropped_mid_narration_stops_the_flow() {
        let svc = service(None).with_narrator(Arc::new(ChattyNarrator {
            chunks: 4 * NARRATIVE_BUFFER,
        }));
        let (tx, mut rx) = mpsc::channel(1);
        let reader = tokio::spawn(async move {
            let analysis = rx.recv().await;
            let chunk = rx.recv().await;
            (analysis, chunk)
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            svc.analyze("UP", &BasisCodes::default(), &tx),
        )
        .await
        .expect("analysis should stop once the receiver is gone");
        assert_eq!(result, Err(StreamClosed));

        let (analysis, chunk) = reader.await.unwrap();
        assert!(matches!(analysis, Some(Fragment::Analysis(_))));
        assert_eq!(chunk, Some(Fragment::narrative("UP", "UP chunk 0".into())));
    }

    #[tokio::test]
    async fn scan_ranks_narrates_top_and_summarises() {
        let svc = service(Some(ScriptedNarrator { fail: false })).with_options(AnalyzerOptions {
            min_score: 55,
            ..AnalyzerOptions::default()
        });
        let list = codes(&["DOWN", "NOPE", "UP"]);
        let list_copy = list.clone();
        let (result, fragments) = collect(|tx| async move { svc.scan(&list, &tx).await }).await;
        assert_eq!(result, Ok(()));

        // Two ranked rows, best first.
        let ranked: Vec<(&str, Status)> = fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Ranked(r) => Some((r.futures_code.as_str(), r.status)),
                _ => None,
            })
            .collect();
        assert_eq!(ranked, vec![("UP", Status::Waiting), ("DOWN", Status::Completed)]);
        assert_eq!(fragments[0], Fragment::scan_start(&list_copy, 55));

        let tail = &fragments[3..];
        assert_eq!(tail[0], Fragment::analyzing("UP"));
        assert_eq!(tail[1], Fragment::narrative("UP", "UP part 1".into()));
        assert_eq!(tail[2], Fragment::narrative("UP", "UP part 2".into()));
        assert_eq!(tail[3], Fragment::scan_summary(2, 1));
        assert_eq!(tail.len(), 4);
    }

    #[tokio::test]
    async fn scan_all_fetches_failing_emits_single_error() {
        let svc = service(Some(ScriptedNarrator { fail: false }));
        let list = codes(&["NOPE", "EMPTY"]);
        let (result, fragments) = collect(|tx| async move { svc.scan(&list, &tx).await }).await;
        assert_eq!(result, Ok(()));
        assert_eq!(fragments.len(), 2);
        assert!(matches!(fragments[0], Fragment::ScanStart(_)));
        assert!(fragments[1].is_error());
    }

    #[tokio::test]
    async fn scan_without_narrator_skips_analysis_markers() {
        let svc = service(None);
        let list = codes(&["UP", "DOWN"]);
        let (_, fragments) = collect(|tx| async move { svc.scan(&list, &tx).await }).await;
        assert_eq!(fragments.len(), 4);
        assert_eq!(fragments[3], Fragment::scan_summary(2, 2));
    }
}
