use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_bybit::BybitConfig;
use tally_config::{AppConfig, BybitSettings, FetchConfig, LedgerConfig};
use tally_data::{ChunkSequencer, FetchSettings, LogQuery, PaginatedFetcher};
use tally_ledger::{LedgerFormatter, LedgerWriter, TradeAggregator};
use tracing::{info, warn};

/// One export run over an inclusive date period.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub start: String,
    pub end: String,
    pub chunk_size_days: u32,
    pub output: PathBuf,
}

/// What an export run produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub records: usize,
    pub trades: usize,
    pub rows: usize,
    /// `None` when the period held no records and no file was written.
    pub path: Option<PathBuf>,
}

/// Fetch every log record in the period, pair the legs and write the ledger file.
pub async fn export_ledger<Q: LogQuery>(
    query: Q,
    config: &AppConfig,
    request: &ExportRequest,
) -> Result<ExportSummary> {
    let fetcher = PaginatedFetcher::new(query, fetch_settings(&config.fetch));
    let sequencer = ChunkSequencer::new(fetcher);
    let records = sequencer
        .run(&request.start, &request.end, request.chunk_size_days)
        .await?;
    if records.is_empty() {
        warn!(
            start = %request.start,
            end = %request.end,
            "nothing to export"
        );
        return Ok(ExportSummary::default());
    }
    let record_count = records.len();

    let trades = TradeAggregator::new(config.ledger.correlation_key)
        .group(records)
        .context("failed to pair transaction log entries")?;
    let rows = ledger_formatter(&config.ledger)?.format_all(&trades);

    let mut writer = LedgerWriter::create(&request.output)
        .with_context(|| format!("failed to create {}", request.output.display()))?;
    writer.write_rows(&rows)?;
    writer
        .finish()
        .with_context(|| format!("failed to write {}", request.output.display()))?;
    info!(
        trades = trades.len(),
        rows = rows.len(),
        path = %request.output.display(),
        "ledger written"
    );

    Ok(ExportSummary {
        records: record_count,
        trades: trades.len(),
        rows: rows.len(),
        path: Some(request.output.clone()),
    })
}

pub fn fetch_settings(config: &FetchConfig) -> FetchSettings {
    FetchSettings::default()
        .with_page_limit(config.page_limit())
        .with_page_delay(config.page_delay())
}

pub fn ledger_formatter(config: &LedgerConfig) -> Result<LedgerFormatter> {
    Ok(LedgerFormatter::new()
        .with_settlement_currency(&config.settlement_currency)
        .with_source_system(&config.source_system)
        .with_offset(config.offset()?))
}

pub fn bybit_config(settings: &BybitSettings) -> BybitConfig {
    BybitConfig {
        base_url: settings.base_url.clone(),
        recv_window_ms: settings.recv_window_ms,
        category: settings.category.clone(),
        account_type: settings.account_type.clone(),
        timeout: settings.timeout(),
        requests_per_second: std::num::NonZeroU32::new(settings.requests_per_second),
    }
}
