// =============================================================================
// Scoring Module
// =============================================================================
//
// Reduces an indicator frame (plus an optional basis frame) to six factor
// sub-scores, a weighted composite in [0, 100] and a recommendation.  Pure
// and synchronous: no I/O, no shared state.

pub mod scorer;
pub mod weights;

pub use scorer::{FuturesScorer, ScoreBreakdown, ScoreError, ScoreResult, SubScores};
pub use weights::Weights;
