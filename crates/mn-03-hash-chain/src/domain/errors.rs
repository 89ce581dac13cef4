//! # Domain Errors

use shared_types::{ConsensusTimestamp, Digest};
use thiserror::Error;

/// Hash chain error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashChainError {
    /// A link does not match its predecessor and is outside the bypass.
    #[error("Hash chain broken at {timestamp}: expected previous hash {expected}, found {found}")]
    Discontinuity {
        /// Index of the offending link in the sequence.
        index: usize,
        /// Timestamp of the offending file.
        timestamp: ConsensusTimestamp,
        /// Hash of the last accepted file.
        expected: Digest,
        /// Previous hash the file embeds.
        found: Digest,
    },
}
