//! ef-results: result series and renderer-facing exports.

pub mod export;
pub mod hash;
pub mod types;

pub use export::{PlotLabels, plot_document, plot_json, write_csv};
pub use hash::fingerprint;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Result series is empty")]
    EmptySeries,

    #[error("Non-finite sample time at index {index}")]
    NonFiniteTime { index: usize },

    #[error("Sample times not strictly increasing at index {index}: {prev} -> {t}")]
    NonIncreasingTime { index: usize, prev: f64, t: f64 },
}
