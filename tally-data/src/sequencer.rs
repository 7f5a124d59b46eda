use tally_core::{DateChunk, RawLogEntry};
use tracing::{info, warn};

use crate::{chunks, DataResult, LogQuery, PaginatedFetcher};

/// Drives a chunk plan through a [`PaginatedFetcher`], one chunk at a time.
pub struct ChunkSequencer<Q> {
    fetcher: PaginatedFetcher<Q>,
}

impl<Q: LogQuery> ChunkSequencer<Q> {
    pub fn new(fetcher: PaginatedFetcher<Q>) -> Self {
        Self { fetcher }
    }

    /// Plan `[start_date, end_date]` and fetch every chunk in order.
    ///
    /// Date validation happens before any request is issued.
    pub async fn run(
        &self,
        start_date: &str,
        end_date: &str,
        chunk_size_days: u32,
    ) -> DataResult<Vec<RawLogEntry>> {
        let plan = chunks(start_date, end_date, chunk_size_days)?;
        info!(chunks = plan.len(), start_date, end_date, "generated date chunks");
        Ok(self.run_plan(&plan).await)
    }

    /// Fetch an explicit plan, concatenating results in chunk order.
    pub async fn run_plan(&self, plan: &[DateChunk]) -> Vec<RawLogEntry> {
        let total = plan.len();
        let mut records = Vec::new();
        for (index, chunk) in plan.iter().enumerate() {
            info!(chunk = %chunk, "processing chunk {}/{}", index + 1, total);
            let batch = self.fetcher.fetch(chunk).await;
            if batch.is_empty() {
                info!(chunk = %chunk, "no records in chunk");
                continue;
            }
            info!(chunk = %chunk, records = batch.len(), "found records in chunk");
            records.extend(batch);
        }

        info!(total_records = records.len(), "processing complete");
        if records.is_empty() {
            warn!("no records for period");
        }
        records
    }
}
