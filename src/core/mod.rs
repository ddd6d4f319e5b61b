pub mod config;
pub mod csv_loader;
pub mod errors;
pub mod transaction;

pub use config::{AnalysisConfig, ServerConfig, HOUR_MS};
pub use csv_loader::{CsvLoader, ParseOutcome};
pub use errors::{TraceError, TraceResult};
pub use transaction::Transaction;
