//! # Domain Entities

use shared_types::{ConsensusTimestamp, Digest};
use std::fmt;

/// Outcome of checking one file against the last accepted hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainVerdict {
    /// Embedded previous hash equals the last accepted hash.
    Continuous,
    /// Mismatch outside the bypass window.
    Discontinuous,
    /// Mismatch inside the bypass window; accepted as a known gap.
    Bypassed,
    /// No previous checkpoint; this file seeds the chain.
    Genesis,
}

impl ChainVerdict {
    /// True for every verdict except `Discontinuous`.
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, ChainVerdict::Discontinuous)
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainVerdict::Continuous => "continuous",
            ChainVerdict::Discontinuous => "discontinuous",
            ChainVerdict::Bypassed => "bypassed",
            ChainVerdict::Genesis => "genesis",
        }
    }
}

impl fmt::Display for ChainVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The chain-relevant facts of one stream file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainLink {
    /// Consensus timestamp of the file.
    pub timestamp: ConsensusTimestamp,
    /// Hash the file embeds for its predecessor.
    pub previous_hash: Digest,
    /// The file's own content hash.
    pub hash: Digest,
}
