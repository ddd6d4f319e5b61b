pub mod analysis;
pub mod api;
pub mod core;
pub mod metrics;

pub use analysis::{AnalysisEngine, AnalysisReport};
pub use core::{AnalysisConfig, Transaction};
