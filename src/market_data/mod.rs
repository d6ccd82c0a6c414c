pub mod bar;
pub mod basis;

// Re-export the core series types for convenient access (e.g. `use crate::market_data::BarSeries`).
pub use bar::{Bar, BarSeries, ColumnSet, SeriesError};
pub use basis::{BasisFrame, BasisRow};
