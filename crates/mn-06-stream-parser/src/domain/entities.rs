//! # Domain Entities

use crate::domain::aggregates::FileAggregates;
use shared_types::{Digest, StreamFilename};

/// Outcome of persisting one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSummary {
    /// File persisted.
    pub name: StreamFilename,
    /// Its content hash.
    pub hash: Digest,
    /// Records handed to the persister in the committed attempt.
    pub records: u64,
    /// Attempts used, including the committed one.
    pub attempts: u32,
    /// Aggregates committed with the file.
    pub aggregates: FileAggregates,
}
