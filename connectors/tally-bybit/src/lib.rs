//! Bybit v5 connector answering transaction-log page requests.

mod auth;
mod client;

pub use auth::{BybitCredentials, Signer};
pub use client::{BybitConfig, BybitLogClient, TRANSACTION_LOG_PATH};
