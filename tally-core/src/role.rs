use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RawLogEntry;

/// Field used to link the two legs of one transaction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKey {
    #[default]
    TradeId,
    OrderId,
}

impl CorrelationKey {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrelationKey::TradeId => "trade_id",
            CorrelationKey::OrderId => "order_id",
        }
    }

    /// Extract this key from a log entry, if present.
    pub fn extract(self, entry: &RawLogEntry) -> Option<&str> {
        match self {
            CorrelationKey::TradeId => entry.trade_id.as_deref(),
            CorrelationKey::OrderId => entry.order_id.as_deref(),
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trade_id" | "tradeId" => Ok(CorrelationKey::TradeId),
            "order_id" | "orderId" => Ok(CorrelationKey::OrderId),
            other => Err(format!("unknown correlation key: {other}")),
        }
    }
}

/// Role a log entry plays inside a two-legged trade.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LegRole {
    /// Movement of the traded asset (the symbol's base coin).
    Asset,
    /// Movement of the settlement cash (the symbol's quote coin).
    Cash,
}

impl LegRole {
    /// Infer the role from the instrument symbol, e.g. `BTCUSDT` + `BTC` is the asset leg.
    ///
    /// Returns `None` when the symbol is absent or does not single out the currency.
    pub fn infer(entry: &RawLogEntry) -> Option<Self> {
        let symbol = entry.symbol.as_deref()?.to_ascii_uppercase();
        let currency = entry.currency.to_ascii_uppercase();
        if currency.is_empty() || symbol.len() <= currency.len() {
            return None;
        }
        match (symbol.starts_with(&currency), symbol.ends_with(&currency)) {
            (true, false) => Some(LegRole::Asset),
            (false, true) => Some(LegRole::Cash),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LegRole::Asset => "asset",
            LegRole::Cash => "cash",
        }
    }
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
