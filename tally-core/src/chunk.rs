use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DATE_FORMAT;

/// Inclusive calendar-day window queried as a single unit against the remote API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DateChunk {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateChunk {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "chunk start must not be after its end");
        Self { start, end }
    }

    /// Chunk covering exactly one calendar day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Number of calendar days covered, counting both boundaries.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// First instant of the window (midnight UTC of `start`).
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of the window (end of day UTC of `end`).
    pub fn end_time(&self) -> DateTime<Utc> {
        let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.end.and_time(last).and_utc()
    }
}

impl fmt::Display for DateChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn window_spans_whole_days() {
        let chunk = DateChunk::new(day("2024-11-01"), day("2024-11-07"));
        assert_eq!(chunk.days(), 7);
        assert_eq!(chunk.start_time().to_rfc3339(), "2024-11-01T00:00:00+00:00");
        assert_eq!(chunk.end_time().timestamp_millis() + 1, {
            day("2024-11-08").and_time(NaiveTime::MIN).and_utc().timestamp_millis()
        });
    }

    #[test]
    fn single_day_covers_one_day() {
        let chunk = DateChunk::single_day(day("2024-02-29"));
        assert_eq!(chunk.days(), 1);
        assert_eq!(chunk.to_string(), "2024-02-29..2024-02-29");
    }
}
