// =============================================================================
// Futures Scorer: library root
// =============================================================================
//
// Turns daily futures bars into a 0-100 score and a trading recommendation:
//
//   market_data  bar series and basis frames
//   indicators   base + futures indicator columns
//   scoring      six-factor sub-scores and the weighted composite
//   analyzer     async single-instrument / batch flows streaming fragments
//   sources      CSV data source and exchange helpers
// =============================================================================

pub mod analyzer;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod scoring;
pub mod sources;
pub mod types;

pub use analyzer::{AnalyzerService, Fragment};
pub use indicators::{FuturesIndicators, IndicatorFrame};
pub use market_data::{BarSeries, BasisFrame};
pub use scoring::{FuturesScorer, Weights};
pub use types::Recommendation;
