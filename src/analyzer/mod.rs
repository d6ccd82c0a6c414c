// =============================================================================
// Analyzer Module
// =============================================================================
//
// Async facade over the synchronous scoring core:
// - `DataSource` / `NarrativeGenerator` seams and their error types
// - Fragment wire types streamed to the caller
// - `AnalyzerService` single-instrument and batch flows

pub mod fragment;
pub mod narrative;
pub mod service;
pub mod snapshot;
pub mod source;

pub use fragment::{Fragment, Status};
pub use narrative::{LlmNarrator, NarrativeError, NarrativeGenerator, NarratorConfig};
pub use service::{AnalyzerOptions, AnalyzerService, BasisCodes, StreamClosed};
pub use snapshot::Snapshot;
pub use source::{fetch_many, DataSource, DateRange, FetchError};
