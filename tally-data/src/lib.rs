//! Retrieval of exchange transaction logs over arbitrary date spans.
//!
//! The span is split into bounded [`DateChunk`](tally_core::DateChunk)s, each chunk
//! is drained page by page through a [`LogQuery`] capability, and chunks are
//! processed strictly one after another so a shared rate limit is never exceeded.

mod chunk;
mod error;
mod fetch;
#[cfg(any(test, feature = "test-util"))]
mod scripted;
mod sequencer;

pub use chunk::{chunk_range, chunks, parse_date};
pub use error::{DataError, DataResult};
pub use fetch::{FetchSettings, LogQuery, PaginatedFetcher};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedQuery;
pub use sequencer::ChunkSequencer;
