//! # Domain Entities
//!
//! Signature files and verification outcomes.

use shared_crypto::{CryptoError, SignatureScheme};
use shared_types::{Digest, NodeId};
use std::fmt;

// =============================================================================
// Signature Files
// =============================================================================

/// One node's signature over a data file hash.
///
/// Ephemeral: decoded, verified, discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureFile {
    /// Signing node, taken from the object key.
    pub node_id: NodeId,
    /// Data file hash the node declares.
    pub file_hash: Digest,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// Algorithm of `signature`.
    pub scheme: SignatureScheme,
}

// =============================================================================
// Verification Results
// =============================================================================

/// Quorum verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// Valid stake strictly exceeds the threshold.
    Accepted,
    /// Some signatures, not enough valid stake.
    InsufficientStake,
    /// No signature files at all.
    NoSignatures,
}

impl VerificationStatus {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Accepted => "accepted",
            VerificationStatus::InsufficientStake => "insufficient_stake",
            VerificationStatus::NoSignatures => "no_signatures",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a signature did not count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// Node id not in the address book.
    UnknownNode,
    /// Declared hash differs from the candidate hash.
    HashMismatch,
    /// Node already contributed a signature.
    Duplicate,
    /// Cryptographic check failed.
    InvalidSignature(CryptoError),
}

/// A signature that did not count, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRejection {
    /// Node that produced it.
    pub node_id: NodeId,
    /// Reason.
    pub reason: RejectionReason,
}

/// Outcome of verifying one candidate hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    /// Verdict.
    pub status: VerificationStatus,
    /// Candidate hash.
    pub file_hash: Digest,
    /// Summed weight of valid signers.
    pub valid_weight: u64,
    /// Address book total weight.
    pub total_weight: u64,
    /// Valid signers in ascending node id order.
    pub signers: Vec<NodeId>,
    /// Signatures that did not count.
    pub rejected: Vec<SignatureRejection>,
}

impl VerificationReport {
    /// True if the verdict is `Accepted`.
    pub fn is_accepted(&self) -> bool {
        self.status == VerificationStatus::Accepted
    }
}
