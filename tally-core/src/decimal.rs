//! Decimal parsing and serde helpers for exchange payloads.
//!
//! Exchanges encode amounts as strings that may be empty, carry trailing zeros,
//! or (rarely) use scientific notation. Everything is kept in [`Decimal`] so no
//! amount ever passes through binary floating point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Parse a textual amount, accepting plain and scientific notation.
///
/// Returns `None` for amounts that cannot be held without rounding.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed).ok()
    } else {
        Decimal::from_str_exact(trimmed).ok()
    }
}

/// Render an amount as a fixed-point string with trailing zeros removed.
pub fn to_plain_string(value: Decimal) -> String {
    value.normalize().to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Str(String),
    Num(serde_json::Number),
}

impl StrOrNum {
    fn into_text(self) -> String {
        match self {
            StrOrNum::Str(s) => s,
            StrOrNum::Num(v) => v.to_string(),
        }
    }
}

/// Deserialize a required decimal encoded as string or number.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = StrOrNum::deserialize(deserializer)?.into_text();
    parse_decimal(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount: {raw:?}")))
}

/// Deserialize an optional decimal where empty strings mean "absent".
pub fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StrOrNum>::deserialize(deserializer)?;
    match raw.map(StrOrNum::into_text) {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_decimal(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount: {text:?}"))),
    }
}

/// Deserialize an optional identifier where empty strings mean "absent".
pub fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StrOrNum>::deserialize(deserializer)?;
    Ok(raw
        .map(StrOrNum::into_text)
        .filter(|value| !value.trim().is_empty()))
}

/// Deserialize a millisecond epoch timestamp encoded as string or number.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = StrOrNum::deserialize(deserializer)?.into_text();
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid millisecond timestamp: {raw:?}")))
}
