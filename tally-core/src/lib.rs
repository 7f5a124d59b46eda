//! Core domain types shared by the Tally fetch and ledger crates.

mod chunk;
pub mod decimal;
mod log;
mod role;

pub use chunk::DateChunk;
pub use log::{LogRequest, Page, RawLogEntry};
pub use role::{CorrelationKey, LegRole};

/// Calendar date format accepted on every user-facing surface.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
