// =============================================================================
// Futures Scorer: Command-line Entry Point
// =============================================================================
//
//   futures-scorer [--config FILE] [--spot CODE] [--far CODE]
//                  [--start DATE] [--end DATE] [--min-score N] CODE...
//
// One code runs a single-instrument analysis; several run a batch scan.  Each
// fragment is printed to stdout as one JSON line; logs go to stderr.
// =============================================================================

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use futures_scorer::analyzer::source::parse_date;
use futures_scorer::analyzer::{AnalyzerService, BasisCodes, Fragment, LlmNarrator};
use futures_scorer::indicators::FuturesIndicators;
use futures_scorer::runtime_config::{parse_codes, RuntimeConfig};
use futures_scorer::scoring::FuturesScorer;
use futures_scorer::sources::{classify, is_main_contract, CsvDataSource};

const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

/// Fragments buffered between the analyzer and the printer.
const OUTPUT_BUFFER: usize = 64;

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<String>,
    basis: BasisCodes,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    min_score: Option<u8>,
    codes: Vec<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut out = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} expects a value"))
            };
            match arg.as_str() {
                "--config" => out.config = Some(value("--config")?),
                "--spot" => out.basis.spot = Some(value("--spot")?.to_uppercase()),
                "--far" => out.basis.far = Some(value("--far")?.to_uppercase()),
                "--start" => out.start = Some(parse_date(&value("--start")?)?),
                "--end" => out.end = Some(parse_date(&value("--end")?)?),
                "--min-score" => {
                    let raw = value("--min-score")?;
                    let score: u8 = raw
                        .parse()
                        .with_context(|| format!("invalid --min-score '{raw}'"))?;
                    if score > 100 {
                        bail!("--min-score must be between 0 and 100");
                    }
                    out.min_score = Some(score);
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                codes => out.codes.extend(parse_codes(codes)),
            }
        }
        Ok(out)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    // ── 2. Configuration ─────────────────────────────────────────────────
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env();

    let codes = if args.codes.is_empty() {
        config.codes.clone()
    } else {
        args.codes.clone()
    };
    if codes.is_empty() {
        bail!("no futures codes given; pass them as arguments or set FUTURES_CODES");
    }
    for code in &codes {
        debug!(
            futures_code = %code,
            exchange = %classify(code),
            main_contract = is_main_contract(code),
            "instrument"
        );
    }

    // ── 3. Wire the analyzer ─────────────────────────────────────────────
    let source = CsvDataSource::new(&config.data_dir).with_lookback_days(config.lookback_days);
    let indicators = FuturesIndicators::new(config.indicators.clone(), config.futures.clone());
    let scorer = FuturesScorer::new(config.weights);

    let mut options = config.analyzer_options();
    options.start = args.start;
    options.end = args.end;
    if let Some(min_score) = args.min_score {
        options.min_score = min_score;
    }

    let mut service = AnalyzerService::new(Arc::new(source), indicators, scorer).with_options(options);
    match config.narrator.clone() {
        Some(narrator_config) => {
            let narrator = LlmNarrator::new(narrator_config).context("failed to build narrator client")?;
            service = service.with_narrator(Arc::new(narrator));
        }
        None => info!("no narrator configured, narrative analysis disabled"),
    }

    // ── 4. Run and print ─────────────────────────────────────────────────
    let (tx, mut rx) = mpsc::channel::<Fragment>(OUTPUT_BUFFER);
    let printer = tokio::spawn(async move {
        while let Some(fragment) = rx.recv().await {
            match serde_json::to_string(&fragment) {
                Ok(line) => println!("{line}"),
                Err(e) => error!(error = %e, "failed to serialise fragment"),
            }
        }
    });

    let outcome = if let [code] = codes.as_slice() {
        service.analyze(code, &args.basis, &tx).await
    } else {
        if args.basis != BasisCodes::default() {
            warn!("--spot / --far only apply to single-instrument analysis");
        }
        service.scan(&codes, &tx).await
    };
    drop(tx);

    printer.await.context("output task failed")?;
    outcome.context("output stream closed early")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_codes_and_flags() {
        let args = parse(&["rb2405,cu2406", "--spot", "rb_spot", "--min-score", "60", "AU2406"]).unwrap();
        assert_eq!(args.codes, vec!["RB2405", "CU2406", "AU2406"]);
        assert_eq!(args.basis.spot.as_deref(), Some("RB_SPOT"));
        assert_eq!(args.min_score, Some(60));
    }

    #[test]
    fn parses_dates() {
        let args = parse(&["--start", "20240101", "--end", "2024-06-30", "IF88"]).unwrap();
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--spot"]).is_err());
        assert!(parse(&["--min-score", "101"]).is_err());
        assert!(parse(&["--start", "yesterday"]).is_err());
    }
}
