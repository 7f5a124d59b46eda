use chrono::NaiveDate;
use thiserror::Error;

/// Result alias for data retrieval operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised while planning a retrieval run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDateFormat(String),
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("chunk size must be at least one day")]
    InvalidChunkSize,
}
