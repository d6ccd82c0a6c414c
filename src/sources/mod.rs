// =============================================================================
// Sources Module
// =============================================================================
//
// Concrete market-data adapters behind `analyzer::DataSource`, plus futures
// code helpers shared by them.

pub mod csv;
pub mod exchange;

pub use self::csv::CsvDataSource;
pub use exchange::{classify, is_main_contract, Exchange};
