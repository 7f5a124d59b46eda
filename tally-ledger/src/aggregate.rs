use std::collections::HashMap;

use tally_core::{CorrelationKey, LegRole, RawLogEntry};
use tracing::debug;

use crate::{LedgerError, LedgerResult};

/// Both legs of one transaction, tagged by role rather than by position.
#[derive(Clone, Debug, PartialEq)]
pub struct TradePair {
    pub key: String,
    pub asset: RawLogEntry,
    pub cash: RawLogEntry,
}

/// Correlation groups in first-seen key order.
#[derive(Clone, Debug, Default)]
pub struct GroupedTrades {
    pairs: Vec<TradePair>,
}

impl GroupedTrades {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradePair> {
        self.pairs.iter()
    }
}

impl IntoIterator for GroupedTrades {
    type Item = TradePair;
    type IntoIter = std::vec::IntoIter<TradePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl<'a> IntoIterator for &'a GroupedTrades {
    type Item = &'a TradePair;
    type IntoIter = std::slice::Iter<'a, TradePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Groups flat log records into two-legged trades.
#[derive(Clone, Copy, Debug, Default)]
pub struct TradeAggregator {
    key: CorrelationKey,
}

impl TradeAggregator {
    pub fn new(key: CorrelationKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> CorrelationKey {
        self.key
    }

    /// Group `records` by correlation key.
    ///
    /// Every group must hold exactly two legs; anything else means an unmatched
    /// or duplicated leg upstream and fails the whole batch.
    pub fn group(&self, records: Vec<RawLogEntry>) -> LedgerResult<GroupedTrades> {
        let mut buckets: Vec<(String, Vec<RawLogEntry>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (position, record) in records.into_iter().enumerate() {
            let key = self
                .key
                .extract(&record)
                .ok_or(LedgerError::MissingCorrelationKey {
                    key: self.key,
                    position,
                })?
                .to_string();
            match positions.get(&key) {
                Some(&slot) => buckets[slot].1.push(record),
                None => {
                    positions.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![record]));
                }
            }
        }

        let mut grouped = GroupedTrades::default();
        for (key, legs) in buckets {
            grouped.pairs.push(pair_legs(key, legs)?);
        }
        debug!(groups = grouped.len(), key = %self.key, "grouped records into trades");
        Ok(grouped)
    }
}

fn pair_legs(key: String, legs: Vec<RawLogEntry>) -> LedgerResult<TradePair> {
    let count = legs.len();
    let [first, second]: [RawLogEntry; 2] = legs
        .try_into()
        .map_err(|_| LedgerError::malformed(&key, format!("expected 2 legs, found {count}")))?;

    match (LegRole::infer(&first), LegRole::infer(&second)) {
        (Some(a), Some(b)) if a == b => Err(LedgerError::malformed(
            &key,
            format!("both legs resolve to the {a} role"),
        )),
        (Some(LegRole::Asset), _) | (_, Some(LegRole::Cash)) => Ok(TradePair {
            key,
            asset: first,
            cash: second,
        }),
        (Some(LegRole::Cash), _) | (_, Some(LegRole::Asset)) => {
            debug!(key = %key, "cash leg arrived first; reordering by symbol");
            Ok(TradePair {
                key,
                asset: second,
                cash: first,
            })
        }
        (None, None) => {
            debug!(key = %key, "symbol does not identify leg roles; using arrival order");
            Ok(TradePair {
                key,
                asset: first,
                cash: second,
            })
        }
    }
}
