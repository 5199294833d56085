use chrono::NaiveDate;
use thiserror::Error;

use crate::models::ModelKind;

/// Failures raised by the forecasting pipeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid sales record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
    #[error("unsupported model '{0}' (expected 'linear' or 'arima')")]
    UnsupportedModel(String),
    #[error("{model} model needs at least {required} monthly observations, window has {actual}")]
    InsufficientWindow {
        model: ModelKind,
        required: usize,
        actual: usize,
    },
    #[error("training window for {target_year} is missing {} month(s)", .missing.len())]
    MissingMonths {
        target_year: i32,
        missing: Vec<NaiveDate>,
    },
    #[error("invalid target year '{0}': expected a four-digit year")]
    InvalidTargetYear(String),
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
