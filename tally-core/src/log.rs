use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::decimal::{
    deserialize_decimal, deserialize_millis, deserialize_opt_decimal, deserialize_opt_string,
};

const BUY_SIDE: &str = "Buy";

/// One account transaction-log record exactly as reported by the exchange.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEntry {
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub category: Option<String>,
    #[serde(default)]
    pub side: String,
    #[serde(rename = "type", default, deserialize_with = "deserialize_opt_string")]
    pub entry_type: Option<String>,
    #[serde(deserialize_with = "deserialize_millis")]
    pub transaction_time: DateTime<Utc>,
    pub currency: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub cash_flow: Decimal,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub trade_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub fee: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub fee_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub trade_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub order_id: Option<String>,
}

impl RawLogEntry {
    /// Minimal entry carrying only the fields every leg has.
    pub fn new(currency: impl Into<String>, cash_flow: Decimal, time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            symbol: None,
            category: None,
            side: String::new(),
            entry_type: None,
            transaction_time: time,
            currency: currency.into(),
            cash_flow,
            trade_price: None,
            fee: None,
            fee_rate: None,
            trade_id: None,
            order_id: None,
        }
    }

    #[must_use]
    pub fn with_side(mut self, side: impl Into<String>) -> Self {
        self.side = side.into();
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_trade_price(mut self, price: Decimal) -> Self {
        self.trade_price = Some(price);
        self
    }

    #[must_use]
    pub fn with_fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = Some(fee_rate);
        self
    }

    #[must_use]
    pub fn with_trade_id(mut self, trade_id: impl Into<String>) -> Self {
        self.trade_id = Some(trade_id.into());
        self
    }

    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Whether the exchange tagged this leg as part of a buy.
    pub fn is_buy(&self) -> bool {
        self.side.eq_ignore_ascii_case(BUY_SIDE)
    }
}

/// Parameters of a single page request against the remote log endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub limit: usize,
    pub cursor: Option<String>,
}

/// One page of remote results.
///
/// `items == None` marks a response without an extractable list, which callers
/// treat as end-of-data rather than as a failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub items: Option<Vec<RawLogEntry>>,
    pub next_cursor: Option<String>,
}

impl Page {
    pub fn new(items: Vec<RawLogEntry>) -> Self {
        Self {
            items: Some(items),
            next_cursor: None,
        }
    }

    /// Page whose payload carried no item list at all.
    pub fn without_list() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Continuation token, ignoring the empty string some APIs send on the last page.
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deserializes_exchange_payload() {
        let payload = r#"{
            "id": "592324_XRPUSDT_161440249321",
            "symbol": "XRPUSDT",
            "category": "spot",
            "side": "Buy",
            "transactionTime": "1692943200000",
            "type": "TRADE",
            "qty": "4",
            "size": "",
            "currency": "XRP",
            "tradePrice": "0.5142",
            "funding": "",
            "fee": "",
            "cashFlow": "4",
            "change": "4",
            "cashBalance": "4",
            "feeRate": "",
            "bonusChange": "",
            "tradeId": "2100000000007764263",
            "orderId": "1672304111234566",
            "orderLinkId": ""
        }"#;
        let entry: RawLogEntry = serde_json::from_str(payload).unwrap();
        assert_eq!(entry.symbol.as_deref(), Some("XRPUSDT"));
        assert!(entry.is_buy());
        assert_eq!(entry.cash_flow, dec!(4));
        assert_eq!(entry.trade_price, Some(dec!(0.5142)));
        assert_eq!(entry.fee_rate, None);
        assert_eq!(entry.trade_id.as_deref(), Some("2100000000007764263"));
        assert_eq!(entry.transaction_time.timestamp_millis(), 1_692_943_200_000);
    }

    #[test]
    fn rejects_unparseable_amount() {
        let payload = r#"{"transactionTime":"1","currency":"USDT","cashFlow":"n/a"}"#;
        assert!(serde_json::from_str::<RawLogEntry>(payload).is_err());
    }

    #[test]
    fn empty_cursor_is_not_a_continuation() {
        let page = Page::new(Vec::new()).with_cursor("");
        assert_eq!(page.continuation(), None);
        let page = Page::new(Vec::new()).with_cursor("abc%3D");
        assert_eq!(page.continuation(), Some("abc%3D"));
    }
}
