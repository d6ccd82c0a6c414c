// =============================================================================
// Runtime Configuration: scorer, indicator and analyzer settings
// =============================================================================
//
// Loaded from a JSON file.  Every field carries `#[serde(default)]` so that a
// partial (or empty) file still yields a complete configuration, and adding
// fields never breaks loading an older file.
//
// Environment overrides (applied after loading, `.env` honoured):
//   FUTURES_CODES      comma-separated instrument codes
//   FUTURES_DATA_DIR   directory holding `<code>.csv`
//   LLM_API_URL        enables the narrator
//   LLM_API_KEY
//   LLM_MODEL
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzer::{AnalyzerOptions, NarratorConfig};
use crate::indicators::{FuturesParams, IndicatorParams};
use crate::scoring::Weights;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_max_concurrency() -> usize {
    5
}

fn default_top_k() -> usize {
    5
}

fn default_lookback_days() -> i64 {
    365
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Engine parameters --------------------------------------------------
    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub futures: FuturesParams,

    #[serde(default)]
    pub weights: Weights,

    // --- Analyzer flows -----------------------------------------------------
    /// Maximum concurrent fetches during a batch scan.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Instruments narrated after a batch scan.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Scan filter: instruments below this score are reported as completed.
    #[serde(default)]
    pub min_score: u8,

    /// Ask the narrator for a streamed reply.
    #[serde(default = "default_true")]
    pub streaming: bool,

    // --- Data ---------------------------------------------------------------
    /// Calendar days of history fetched when no start date is given.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Instruments analysed when none are given on the command line.
    #[serde(default)]
    pub codes: Vec<String>,

    /// Narrator endpoint; narration is skipped when absent.
    #[serde(default)]
    pub narrator: Option<NarratorConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            futures: FuturesParams::default(),
            weights: Weights::default(),
            max_concurrency: default_max_concurrency(),
            top_k: default_top_k(),
            min_score: 0,
            streaming: true,
            lookback_days: default_lookback_days(),
            data_dir: default_data_dir(),
            codes: Vec::new(),
            narrator: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            codes = ?config.codes,
            data_dir = %config.data_dir.display(),
            narrator = config.narrator.is_some(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(codes) = get("FUTURES_CODES") {
            self.codes = parse_codes(&codes);
        }
        if let Some(dir) = get("FUTURES_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(url) = get("LLM_API_URL") {
            let narrator = self.narrator.get_or_insert_with(|| NarratorConfig {
                api_url: String::new(),
                api_key: String::new(),
                model: String::new(),
                timeout_secs: 60,
            });
            narrator.api_url = url;
            if narrator.model.is_empty() {
                narrator.model = "gpt-4o-mini".to_string();
            }
        }
        if let Some(narrator) = self.narrator.as_mut() {
            if let Some(key) = get("LLM_API_KEY") {
                narrator.api_key = key;
            }
            if let Some(model) = get("LLM_MODEL") {
                narrator.model = model;
            }
        }
    }

    /// Analyzer options derived from this configuration.
    pub fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            max_concurrency: self.max_concurrency,
            top_k: self.top_k,
            min_score: self.min_score,
            streaming: self.streaming,
            start: None,
            end: None,
        }
    }
}

/// Split a comma-separated code list, upper-casing and dropping blanks.
pub fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
