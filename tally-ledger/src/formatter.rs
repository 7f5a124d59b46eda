use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::Decimal;

use crate::{GroupedTrades, LedgerRow, TradePair, TransactionType};

/// Layout of the ledger DATE column.
pub const DATE_LAYOUT: &str = "%d.%m.%Y %H:%M:%S";

const DEFAULT_SETTLEMENT_CURRENCY: &str = "USD";
const DEFAULT_SOURCE_SYSTEM: &str = "bybit";

/// Ledger rows produced for one trade.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerPair {
    pub asset: LedgerRow,
    pub cash: LedgerRow,
}

impl LedgerPair {
    pub fn into_rows(self) -> [LedgerRow; 2] {
        [self.asset, self.cash]
    }
}

impl fmt::Display for LedgerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.asset, self.cash)
    }
}

/// Converts paired trade legs into ledger rows.
#[derive(Clone, Debug)]
pub struct LedgerFormatter {
    settlement_currency: String,
    source_system: String,
    offset: FixedOffset,
}

impl Default for LedgerFormatter {
    fn default() -> Self {
        Self {
            settlement_currency: DEFAULT_SETTLEMENT_CURRENCY.to_string(),
            source_system: DEFAULT_SOURCE_SYSTEM.to_string(),
            offset: Utc.fix(),
        }
    }
}

impl LedgerFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settlement_currency(mut self, currency: impl Into<String>) -> Self {
        self.settlement_currency = currency.into();
        self
    }

    #[must_use]
    pub fn with_source_system(mut self, system: impl Into<String>) -> Self {
        self.source_system = system.into();
        self
    }

    /// Render dates in `offset` instead of UTC.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Build the asset-leg and cash-leg rows for one trade.
    ///
    /// A buy moves the asset in and the cash out; anything else is the reverse.
    pub fn format(&self, pair: &TradePair) -> LedgerPair {
        let (asset_kind, cash_kind) = if pair.asset.is_buy() {
            (TransactionType::ShareBuy, TransactionType::ShareOut)
        } else {
            (TransactionType::ShareSell, TransactionType::ShareIn)
        };
        let date = pair
            .asset
            .transaction_time
            .with_timezone(&self.offset)
            .format(DATE_LAYOUT)
            .to_string();

        let asset = LedgerRow {
            kind: asset_kind,
            date: date.clone(),
            ticker: self_pair(&pair.asset.currency),
            quantity: pair.asset.cash_flow.abs(),
            price: pair.asset.trade_price,
            fee: pair.cash.fee_rate.unwrap_or(Decimal::ZERO),
            currency: pair.cash.currency.clone(),
            fee_currency: pair.cash.currency.clone(),
            link_id: pair.key.clone(),
            trade_system_id: self.source_system.clone(),
        };
        let cash = LedgerRow {
            kind: cash_kind,
            date,
            ticker: self_pair(&pair.cash.currency),
            quantity: pair.cash.cash_flow.abs(),
            price: Some(Decimal::ONE),
            fee: Decimal::ZERO,
            currency: self.settlement_currency.clone(),
            fee_currency: self.settlement_currency.clone(),
            link_id: pair.key.clone(),
            trade_system_id: self.source_system.clone(),
        };
        LedgerPair { asset, cash }
    }

    /// Format every trade, keeping group order and asset-before-cash within a trade.
    pub fn format_all(&self, trades: &GroupedTrades) -> Vec<LedgerRow> {
        trades
            .iter()
            .flat_map(|pair| self.format(pair).into_rows())
            .collect()
    }
}

fn self_pair(currency: &str) -> String {
    format!("{currency}:{currency}")
}
