use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Months, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tally_bybit::{BybitCredentials, BybitLogClient};
use tally_config::{load_config, AppConfig};
use tally_core::DATE_FORMAT;
use tally_data::{chunks, parse_date};
use tracing::info;

use crate::export::{bybit_config, export_ledger, ExportRequest};
use crate::telemetry::init_tracing;

const API_KEY_VAR: &str = "BYBIT_API_KEY";
const API_SECRET_VAR: &str = "BYBIT_API_SECRET";

#[derive(Parser)]
#[command(author, version, about = "Export Bybit trades into ledger import files")]
pub struct Cli {
    /// Increases logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Selects which configuration environment to load (maps to config/{env}.toml)
    #[arg(long, default_value = "default")]
    env: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transaction log for a period and write the ledger file
    Export(ExportArgs),
    /// Print the date chunks a period is fetched in, without network access
    Chunks(ChunksArgs),
}

#[derive(Args)]
pub struct PeriodArgs {
    /// First day of the period (YYYY-MM-DD); defaults to one month before today
    #[arg(long)]
    start: Option<String>,
    /// Last day of the period, inclusive (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<String>,
    /// Overrides fetch.chunk_size_days
    #[arg(long)]
    chunk_size_days: Option<u32>,
}

impl PeriodArgs {
    /// Resolve the period against `today`, validating both dates.
    fn resolve(&self, today: NaiveDate) -> Result<(String, String)> {
        let end = match &self.end {
            Some(value) => value.clone(),
            None => today.format(DATE_FORMAT).to_string(),
        };
        let start = match &self.start {
            Some(value) => value.clone(),
            None => today
                .checked_sub_months(Months::new(1))
                .ok_or_else(|| anyhow!("cannot derive a start date from {today}"))?
                .format(DATE_FORMAT)
                .to_string(),
        };
        let start = parse_date(&start)?.format(DATE_FORMAT).to_string();
        let end = parse_date(&end)?.format(DATE_FORMAT).to_string();
        Ok((start, end))
    }

    fn chunk_size(&self, config: &AppConfig) -> u32 {
        self.chunk_size_days.unwrap_or(config.fetch.chunk_size_days)
    }
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    period: PeriodArgs,
    /// Destination file; defaults to {output.dir}/bybit_trades_{start}_to_{end}.csv
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    async fn run(&self, config: &AppConfig) -> Result<()> {
        let (start, end) = self.period.resolve(Utc::now().date_naive())?;
        let chunk_size_days = self.period.chunk_size(config);
        // Surface range problems before asking for credentials.
        chunks(&start, &end, chunk_size_days)?;

        let client = BybitLogClient::new(bybit_config(&config.bybit), credentials()?)?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.output.ledger_path(&start, &end));
        info!(%start, %end, chunk_size_days, "exporting Bybit trades");

        let request = ExportRequest {
            start,
            end,
            chunk_size_days,
            output,
        };
        let summary = export_ledger(client, config, &request).await?;
        match summary.path {
            Some(path) => println!(
                "Wrote {} rows for {} trades to {}",
                summary.rows,
                summary.trades,
                path.display()
            ),
            None => println!(
                "No records between {} and {}; nothing written",
                request.start, request.end
            ),
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct ChunksArgs {
    #[command(flatten)]
    period: PeriodArgs,
}

impl ChunksArgs {
    fn run(&self, config: &AppConfig) -> Result<()> {
        let (start, end) = self.period.resolve(Utc::now().date_naive())?;
        let plan = chunks(&start, &end, self.period.chunk_size(config))?;
        for chunk in &plan {
            println!(
                "{} {} {}",
                chunk.start.format(DATE_FORMAT),
                chunk.end.format(DATE_FORMAT),
                chunk.days()
            );
        }
        Ok(())
    }
}

fn credentials() -> Result<BybitCredentials> {
    let api_key = env::var(API_KEY_VAR).with_context(|| format!("{API_KEY_VAR} is not set"))?;
    let api_secret =
        env::var(API_SECRET_VAR).with_context(|| format!("{API_SECRET_VAR} is not set"))?;
    Ok(BybitCredentials {
        api_key,
        api_secret,
    })
}

pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(Some(&cli.env)).context("failed to load configuration")?;

    let filter = env::var("RUST_LOG").unwrap_or_else(|_| match cli.verbose {
        0 => "info".to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    });
    let _guard =
        init_tracing(&filter, &config.output.logs_dir).context("failed to initialize logging")?;

    match cli.command {
        Commands::Export(args) => args.run(&config).await?,
        Commands::Chunks(args) => args.run(&config)?,
    }
    Ok(())
}
