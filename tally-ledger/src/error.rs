use tally_core::CorrelationKey;
use thiserror::Error;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error type surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("malformed correlation group {key}: {reason}")]
    MalformedGroup { key: String, reason: String },
    #[error("log entry at position {position} has no {key}")]
    MissingCorrelationKey { key: CorrelationKey, position: usize },
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::MalformedGroup {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(value: csv::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
