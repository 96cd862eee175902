//! Sync orchestration for addonsync.
//!
//! Ties the table reader, id resolver, registry clients, and the output
//! writers together into a single end-to-end run ([`run_sync`]).

pub mod enrich;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use enrich::{EnrichedRecord, Enricher};
pub use pipeline::{ProgressReporter, SilentProgress, SyncReport, run_sync, sync_with};
