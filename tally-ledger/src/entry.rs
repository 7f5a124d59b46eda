use std::fmt;

use rust_decimal::Decimal;
use tally_core::decimal::to_plain_string;

/// First line of every ledger import file.
pub const FORMAT_VERSION_HEADER: &str = "#CsvFormatVersion:v1";

/// Column order of a ledger row.
pub const LEDGER_COLUMNS: [&str; 13] = [
    "TYPE",
    "DATE",
    "TICKER",
    "QUANTITY",
    "PRICE",
    "FEE",
    "NKD",
    "NOMINAL",
    "CURRENCY",
    "FEE_CURRENCY",
    "NOTE",
    "LINK_ID",
    "TRADE_SYSTEM_ID",
];

/// Enumerates the ledger transaction categories emitted for trades.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransactionType {
    ShareBuy,
    ShareSell,
    ShareIn,
    ShareOut,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::ShareBuy => "SHARE_BUY",
            TransactionType::ShareSell => "SHARE_SELL",
            TransactionType::ShareIn => "SHARE_IN",
            TransactionType::ShareOut => "SHARE_OUT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fixed-column ledger entry. Built only by [`crate::LedgerFormatter`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerRow {
    pub(crate) kind: TransactionType,
    pub(crate) date: String,
    pub(crate) ticker: String,
    pub(crate) quantity: Decimal,
    pub(crate) price: Option<Decimal>,
    pub(crate) fee: Decimal,
    pub(crate) currency: String,
    pub(crate) fee_currency: String,
    pub(crate) link_id: String,
    pub(crate) trade_system_id: String,
}

impl LedgerRow {
    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn fee(&self) -> Decimal {
        self.fee
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn fee_currency(&self) -> &str {
        &self.fee_currency
    }

    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn trade_system_id(&self) -> &str {
        &self.trade_system_id
    }

    /// Rendered columns in [`LEDGER_COLUMNS`] order.
    ///
    /// Quantities are fixed-point with trailing zeros dropped; prices and fees
    /// keep the scale the exchange reported. Accrued interest, nominal and note
    /// are always empty for exchange trades.
    pub fn fields(&self) -> [String; 13] {
        [
            self.kind.to_string(),
            self.date.clone(),
            self.ticker.clone(),
            to_plain_string(self.quantity),
            self.price.map(|price| price.to_string()).unwrap_or_default(),
            self.fee.to_string(),
            String::new(),
            String::new(),
            self.currency.clone(),
            self.fee_currency.clone(),
            String::new(),
            self.link_id.clone(),
            self.trade_system_id.clone(),
        ]
    }
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields().join(";"))
    }
}
