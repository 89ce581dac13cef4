//! # Domain Entities
//!
//! What a cycle did, and why it stopped.

use mn_03_hash_chain::ChainVerdict;
use shared_types::{
    ConsensusTimestamp, Digest, LastValidCheckpoint, NodeId, StreamFilename, StreamType,
};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stage of the download cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CycleStage {
    /// Listing signature files per node.
    Listing,
    /// Grouping listed signature files by timestamp.
    Grouping,
    /// Establishing quorum on a content hash.
    VerifyingSignatures,
    /// Fetching and decoding the data file.
    Reading,
    /// Checking the embedded previous hash.
    VerifyingChain,
    /// Handing records to the persister.
    Persisting,
    /// Recording the new last valid file.
    Checkpointing,
}

impl CycleStage {
    /// Stage name for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStage::Listing => "listing",
            CycleStage::Grouping => "grouping",
            CycleStage::VerifyingSignatures => "verifying_signatures",
            CycleStage::Reading => "reading",
            CycleStage::VerifyingChain => "verifying_chain",
            CycleStage::Persisting => "persisting",
            CycleStage::Checkpointing => "checkpointing",
        }
    }
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that passed every stage and moved the checkpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedFile {
    /// Data file name.
    pub name: StreamFilename,
    /// Content hash.
    pub hash: Digest,
    /// Embedded previous hash.
    pub previous_hash: Digest,
    /// Chain verdict.
    pub verdict: ChainVerdict,
    /// Nodes that validly signed the hash.
    pub signers: Vec<NodeId>,
    /// Their summed weight.
    pub valid_weight: u64,
    /// Address book total weight.
    pub total_weight: u64,
    /// Records persisted.
    pub records: u64,
    /// Data file size in bytes.
    pub size: usize,
    /// Timestamp of the last record.
    pub consensus_end: ConsensusTimestamp,
}

/// Why a cycle stopped before exhausting its candidates.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HaltReason {
    /// No signature file for the candidate could be fetched and decoded.
    #[error("no signatures for {file}")]
    NoSignatures {
        /// Candidate data file.
        file: StreamFilename,
    },

    /// Valid signatures do not carry enough stake.
    #[error("insufficient stake for {file}: {valid_weight} of {total_weight}")]
    InsufficientStake {
        /// Candidate data file.
        file: StreamFilename,
        /// Weight of the best-supported hash.
        valid_weight: u64,
        /// Address book total weight.
        total_weight: u64,
    },

    /// No signer served a data file matching the consensus hash.
    #[error("no valid data file for {file} from any signer")]
    DataUnavailable {
        /// Candidate data file.
        file: StreamFilename,
    },

    /// The file does not chain onto the last accepted file.
    #[error("hash chain broken at {file}: expected previous hash {expected}, found {found}")]
    Discontinuity {
        /// Candidate data file.
        file: StreamFilename,
        /// Hash of the last accepted file.
        expected: Digest,
        /// Previous hash embedded in the candidate.
        found: Digest,
    },

    /// The parser could not commit the file.
    #[error("persisting {file} failed: {message}")]
    Persist {
        /// Candidate data file.
        file: StreamFilename,
        /// Parser error text.
        message: String,
    },
}

impl HaltReason {
    /// The candidate that halted the cycle.
    pub fn file(&self) -> StreamFilename {
        match self {
            HaltReason::NoSignatures { file }
            | HaltReason::InsufficientStake { file, .. }
            | HaltReason::DataUnavailable { file }
            | HaltReason::Discontinuity { file, .. }
            | HaltReason::Persist { file, .. } => *file,
        }
    }

    /// Stage at which the cycle halted.
    pub fn stage(&self) -> CycleStage {
        match self {
            HaltReason::NoSignatures { .. } | HaltReason::InsufficientStake { .. } => {
                CycleStage::VerifyingSignatures
            }
            HaltReason::DataUnavailable { .. } => CycleStage::Reading,
            HaltReason::Discontinuity { .. } => CycleStage::VerifyingChain,
            HaltReason::Persist { .. } => CycleStage::Persisting,
        }
    }

    /// Short label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HaltReason::NoSignatures { .. } => "no_signatures",
            HaltReason::InsufficientStake { .. } => "insufficient_stake",
            HaltReason::DataUnavailable { .. } => "data_unavailable",
            HaltReason::Discontinuity { .. } => "discontinuity",
            HaltReason::Persist { .. } => "persist",
        }
    }
}

/// How a cycle ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every candidate in the batch was accepted (possibly none).
    Completed,
    /// A candidate could not be accepted; later ones were not attempted.
    Halted(HaltReason),
    /// The stop signal was observed between candidates.
    Cancelled,
}

impl CycleOutcome {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Halted(_) => "halted",
            CycleOutcome::Cancelled => "cancelled",
        }
    }
}

/// Result of one cycle.
#[derive(Clone, Debug)]
pub struct CycleReport {
    /// Stream processed.
    pub stream_type: StreamType,
    /// Checkpoint after the cycle; feed it into the next one.
    pub checkpoint: Option<LastValidCheckpoint>,
    /// Files accepted, in order.
    pub accepted: Vec<AcceptedFile>,
    /// Candidates found after grouping.
    pub candidates: usize,
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// Wall time spent.
    pub elapsed: Duration,
}

impl CycleReport {
    /// True if the cycle halted on a candidate.
    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Halted(_))
    }

    /// The halt reason, if any.
    pub fn halt_reason(&self) -> Option<&HaltReason> {
        match &self.outcome {
            CycleOutcome::Halted(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::FileKind;

    fn name() -> StreamFilename {
        StreamFilename::new(
            StreamType::Record,
            FileKind::Data,
            ConsensusTimestamp::from_parts(1_567_188_900, 0),
        )
    }

    #[test]
    fn test_halt_reason_stage_mapping() {
        let reason = HaltReason::Discontinuity {
            file: name(),
            expected: Digest::new([1; 48]),
            found: Digest::new([2; 48]),
        };
        assert_eq!(reason.stage(), CycleStage::VerifyingChain);
        assert_eq!(reason.file(), name());
        assert_eq!(reason.as_str(), "discontinuity");
        assert!(reason.to_string().contains("2019-08-30T18_15_00Z.rcd"));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(CycleStage::VerifyingSignatures.to_string(), "verifying_signatures");
    }
}
