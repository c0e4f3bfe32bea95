//! Adapter implementations
//!
//! Adapters implement the ports with concrete technologies, and provide the
//! statement sources that feed the engine:
//! - Firefly III HTTP client for the Ledger port
//! - CSV reader producing statement rows
//! - Barclays pipe-delimited export converter
//! - Firefly CSV export re-formatter

pub mod barclays;
pub mod csv_source;
pub mod firefly;
pub mod reexport;

pub use csv_source::{CsvStatementSource, RowError};
pub use firefly::FireflyClient;
