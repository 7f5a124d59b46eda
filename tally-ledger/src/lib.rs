//! Ledger rows and the conversion of paired exchange records into them.

mod aggregate;
mod entry;
mod error;
mod formatter;
mod writer;

pub use aggregate::{GroupedTrades, TradeAggregator, TradePair};
pub use entry::{LedgerRow, TransactionType, FORMAT_VERSION_HEADER, LEDGER_COLUMNS};
pub use error::{LedgerError, LedgerResult};
pub use formatter::{LedgerFormatter, LedgerPair, DATE_LAYOUT};
pub use writer::LedgerWriter;
