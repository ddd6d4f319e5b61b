use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Invalid input row {row}: {reason}")]
    InvalidInputRow { row: usize, reason: String },

    #[error("No valid transactions to analyze")]
    EmptyAnalysis,

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type TraceResult<T> = std::result::Result<T, TraceError>;
