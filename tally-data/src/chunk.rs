use chrono::{Days, NaiveDate};
use tally_core::{DateChunk, DATE_FORMAT};

use crate::{DataError, DataResult};

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> DataResult<NaiveDate> {
    let trimmed = raw.trim();
    // chrono accepts unpadded fields; the ledger surface does not.
    if trimmed.len() != 10 {
        return Err(DataError::InvalidDateFormat(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| DataError::InvalidDateFormat(raw.to_string()))
}

/// Split `[start_date, end_date]` into consecutive chunks of at most `chunk_size_days` days.
pub fn chunks(start_date: &str, end_date: &str, chunk_size_days: u32) -> DataResult<Vec<DateChunk>> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    chunk_range(start, end, chunk_size_days)
}

/// Same as [`chunks`] for already-parsed dates.
///
/// Chunks are inclusive on both ends, contiguous, ordered and never extend past `end`.
pub fn chunk_range(start: NaiveDate, end: NaiveDate, chunk_size_days: u32) -> DataResult<Vec<DateChunk>> {
    if start > end {
        return Err(DataError::InvalidRange { start, end });
    }
    if chunk_size_days == 0 {
        return Err(DataError::InvalidChunkSize);
    }
    if start == end {
        return Ok(vec![DateChunk::single_day(start)]);
    }

    let span = Days::new(u64::from(chunk_size_days - 1));
    let mut plan = Vec::new();
    let mut cursor = start;
    loop {
        let chunk_end = cursor
            .checked_add_days(span)
            .map_or(end, |candidate| candidate.min(end));
        plan.push(DateChunk::new(cursor, chunk_end));
        if chunk_end >= end {
            break;
        }
        match chunk_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Ok(plan)
}
