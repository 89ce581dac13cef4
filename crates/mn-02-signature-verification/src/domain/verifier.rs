//! # Stake-Weighted Signature Verifier
//!
//! Screening (unknown node, hash mismatch, duplicate) is sequential so that
//! "first signature wins" is well defined. The surviving candidates are
//! checked in parallel with rayon; they share no mutable state.

use crate::config::SignatureVerificationConfig;
use crate::domain::entities::{
    RejectionReason, SignatureFile, SignatureRejection, VerificationReport, VerificationStatus,
};
use crate::domain::errors::ThresholdError;
use crate::domain::quorum::QuorumThreshold;
use mn_01_address_book::AddressBook;
use rayon::prelude::*;
use shared_crypto::{verify_signature, CryptoError};
use shared_types::{Digest, NodeId};
use std::collections::HashSet;
use tracing::debug;

/// Verifies signature sets against an address book snapshot.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    threshold: QuorumThreshold,
    parallel_threshold: usize,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self {
            threshold: QuorumThreshold::ONE_THIRD,
            parallel_threshold: SignatureVerificationConfig::default().parallel_threshold,
        }
    }
}

impl SignatureVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: &SignatureVerificationConfig) -> Result<Self, ThresholdError> {
        Ok(Self {
            threshold: config.threshold()?,
            parallel_threshold: config.parallel_threshold,
        })
    }

    /// Create a verifier with an explicit threshold.
    pub fn with_threshold(threshold: QuorumThreshold) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// The quorum fraction in use.
    pub fn threshold(&self) -> QuorumThreshold {
        self.threshold
    }

    /// Decide whether `signatures` establish a quorum for `file_hash`.
    pub fn verify(
        &self,
        file_hash: &Digest,
        signatures: &[SignatureFile],
        book: &AddressBook,
    ) -> VerificationReport {
        let total_weight = book.total_weight();

        if signatures.is_empty() {
            return VerificationReport {
                status: VerificationStatus::NoSignatures,
                file_hash: *file_hash,
                valid_weight: 0,
                total_weight,
                signers: Vec::new(),
                rejected: Vec::new(),
            };
        }

        let mut rejected = Vec::new();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for signature in signatures {
            let reason = if book.get(signature.node_id).is_none() {
                Some(RejectionReason::UnknownNode)
            } else if signature.file_hash != *file_hash {
                Some(RejectionReason::HashMismatch)
            } else if !seen.insert(signature.node_id) {
                Some(RejectionReason::Duplicate)
            } else {
                None
            };
            match reason {
                Some(reason) => rejected.push(SignatureRejection {
                    node_id: signature.node_id,
                    reason,
                }),
                None => candidates.push(signature),
            }
        }

        let check = |signature: &&SignatureFile| -> (NodeId, Result<(), CryptoError>) {
            let outcome = match book.get(signature.node_id) {
                Some(entry) => verify_signature(
                    signature.scheme,
                    &entry.public_key,
                    file_hash.as_bytes(),
                    &signature.signature,
                ),
                None => Err(CryptoError::InvalidPublicKey),
            };
            (signature.node_id, outcome)
        };
        let outcomes: Vec<(NodeId, Result<(), CryptoError>)> =
            if candidates.len() >= self.parallel_threshold {
                candidates.par_iter().map(check).collect()
            } else {
                candidates.iter().map(check).collect()
            };

        let mut signers = Vec::new();
        let mut valid_weight: u64 = 0;
        for (node_id, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    valid_weight =
                        valid_weight.saturating_add(book.weight_of(node_id).unwrap_or(0));
                    signers.push(node_id);
                }
                Err(e) => {
                    debug!(node_id, error = %e, "[mn-02] Signature rejected");
                    rejected.push(SignatureRejection {
                        node_id,
                        reason: RejectionReason::InvalidSignature(e),
                    });
                }
            }
        }
        signers.sort_unstable();

        let status = if self.threshold.is_met(valid_weight, total_weight) {
            VerificationStatus::Accepted
        } else {
            VerificationStatus::InsufficientStake
        };

        VerificationReport {
            status,
            file_hash: *file_hash,
            valid_weight,
            total_weight,
            signers,
            rejected,
        }
    }

    /// Pick the consensus hash from a set of signature files.
    ///
    /// Every distinct declared hash is a candidate. Among accepted candidates
    /// the one with the most valid weight wins, ties broken by the smaller
    /// hash. With no accepted candidate the best-supported one is returned
    /// with its non-accepted verdict. `None` iff `signatures` is empty.
    pub fn select_consensus(
        &self,
        signatures: &[SignatureFile],
        book: &AddressBook,
    ) -> Option<VerificationReport> {
        let mut candidates: Vec<Digest> = signatures.iter().map(|s| s.file_hash).collect();
        candidates.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        candidates.dedup();

        candidates
            .iter()
            .map(|hash| self.verify(hash, signatures, book))
            .reduce(|best, next| {
                let rank = |r: &VerificationReport| (r.is_accepted(), r.valid_weight);
                if rank(&next) > rank(&best) {
                    next
                } else {
                    best
                }
            })
    }
}
