//! Layered settings for the Tally toolchain.
//!
//! Sources are merged in increasing precedence: built-in defaults,
//! `config/default.toml`, `config/{env}.toml`, then `TALLY__`-prefixed
//! environment variables (`TALLY__FETCH__CHUNK_SIZE_DAYS=3`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tally_core::CorrelationKey;

const ENV_PREFIX: &str = "TALLY";
const ENV_SEPARATOR: &str = "__";
const CONFIG_DIR: &str = "config";

/// Upper bound the transaction-log endpoint accepts for `limit`.
pub const MAX_PAGE_LIMIT: usize = 50;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub bybit: BybitSettings,
    pub fetch: FetchConfig,
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BybitSettings {
    pub base_url: String,
    pub recv_window_ms: u64,
    pub category: String,
    pub account_type: String,
    /// Zero disables client-side throttling.
    pub requests_per_second: u32,
    pub timeout_secs: u64,
}

impl Default for BybitSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".into(),
            recv_window_ms: 5_000,
            category: "spot".into(),
            account_type: "UNIFIED".into(),
            requests_per_second: 10,
            timeout_secs: 10,
        }
    }
}

impl BybitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub chunk_size_days: u32,
    pub page_limit: usize,
    pub page_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size_days: 7,
            page_limit: MAX_PAGE_LIMIT,
            page_delay_ms: 50,
        }
    }
}

impl FetchConfig {
    /// Requested page size, clamped to what the endpoint accepts.
    pub fn page_limit(&self) -> usize {
        self.page_limit.clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub settlement_currency: String,
    pub source_system: String,
    pub correlation_key: CorrelationKey,
    pub utc_offset_minutes: i32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            settlement_currency: "USD".into(),
            source_system: "bybit".into(),
            correlation_key: CorrelationKey::TradeId,
            utc_offset_minutes: 0,
        }
    }
}

impl LedgerConfig {
    /// Offset used to render ledger dates.
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!(
                    "ledger.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                )
            })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl OutputConfig {
    /// Ledger file for the inclusive `[start, end]` period.
    pub fn ledger_path(&self, start: &str, end: &str) -> PathBuf {
        self.dir.join(format!("bybit_trades_{start}_to_{end}.csv"))
    }
}

/// Load configuration for `env` from `./config`.
pub fn load_config(env: Option<&str>) -> Result<AppConfig> {
    load_config_from(Path::new(CONFIG_DIR), env)
}

/// Load configuration for `env` from `dir`, with process environment overrides.
pub fn load_config_from(dir: &Path, env: Option<&str>) -> Result<AppConfig> {
    build(dir, env, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn build(dir: &Path, env: Option<&str>, environment: Environment) -> Result<AppConfig> {
    let defaults =
        Config::try_from(&AppConfig::default()).context("failed to serialize default settings")?;
    let mut builder = Config::builder().add_source(defaults).add_source(
        File::from(dir.join("default.toml"))
            .format(FileFormat::Toml)
            .required(false),
    );
    if let Some(env) = env.filter(|env| *env != "default") {
        builder = builder.add_source(
            File::from(dir.join(format!("{env}.toml")))
                .format(FileFormat::Toml)
                .required(false),
        );
    }
    let settings = builder
        .add_source(environment)
        .build()
        .with_context(|| format!("failed to load configuration from {}", dir.display()))?;
    let config: AppConfig = settings
        .try_deserialize()
        .context("failed to decode configuration")?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    fn validate(&self) -> Result<()> {
        if self.fetch.chunk_size_days == 0 {
            return Err(anyhow!("fetch.chunk_size_days must be at least 1"));
        }
        self.ledger.offset()?;
        Ok(())
    }
}
