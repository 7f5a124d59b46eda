use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "tally.log";

/// Install console and JSON file logging.
///
/// The console layer writes to stderr so command output on stdout stays
/// machine-readable. The file layer rotates daily under `logs_dir`. Keep the
/// returned guard alive for the lifetime of the process or buffered file
/// records are lost.
pub fn init_tracing(filter: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create log directory {}", logs_dir.display()))?;
    let env_filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter '{filter}'"))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let file = fmt::layer()
        .json()
        .with_ansi(false)
        .with_current_span(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    Ok(guard)
}
