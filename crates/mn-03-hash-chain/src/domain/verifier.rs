//! # Hash Chain Verifier
//!
//! # Rules
//! 1. No last accepted hash: `Genesis`
//! 2. Empty or all-zero embedded hash: not verifiable, bypass policy decides
//! 3. Embedded hash equals last accepted hash: `Continuous`
//! 4. Otherwise `Bypassed` if `timestamp <= bypass_until`, else `Discontinuous`

use crate::config::HashChainConfig;
use crate::domain::entities::{ChainLink, ChainVerdict};
use crate::domain::errors::HashChainError;
use shared_types::{ConsensusTimestamp, Digest};
use tracing::warn;

/// Check one file's embedded previous hash against the last accepted hash.
///
/// `previous_hash` is `None` when the file carries no previous-hash field.
pub fn verify_link(
    previous_hash: Option<&Digest>,
    last_accepted: Option<&Digest>,
    timestamp: ConsensusTimestamp,
    bypass_until: Option<ConsensusTimestamp>,
) -> ChainVerdict {
    let Some(expected) = last_accepted else {
        return ChainVerdict::Genesis;
    };

    let verifiable = previous_hash.filter(|h| !h.is_zero());
    if verifiable == Some(expected) {
        return ChainVerdict::Continuous;
    }

    match bypass_until {
        Some(until) if timestamp <= until => ChainVerdict::Bypassed,
        _ => ChainVerdict::Discontinuous,
    }
}

/// Walk a sequence of links starting from `last_accepted`.
///
/// Returns the verdict for every link, or the first discontinuity. Each
/// accepted link, bypassed ones included, becomes the expected predecessor
/// of the next.
pub fn verify_sequence(
    links: &[ChainLink],
    last_accepted: Option<Digest>,
    bypass_until: Option<ConsensusTimestamp>,
) -> Result<Vec<ChainVerdict>, HashChainError> {
    let mut expected = last_accepted;
    let mut verdicts = Vec::with_capacity(links.len());

    for (index, link) in links.iter().enumerate() {
        let verdict = verify_link(
            Some(&link.previous_hash),
            expected.as_ref(),
            link.timestamp,
            bypass_until,
        );
        if !verdict.is_acceptable() {
            return Err(HashChainError::Discontinuity {
                index,
                timestamp: link.timestamp,
                expected: expected.unwrap_or(Digest::ZERO),
                found: link.previous_hash,
            });
        }
        verdicts.push(verdict);
        expected = Some(link.hash);
    }

    Ok(verdicts)
}

/// Hash chain verifier bound to a bypass configuration.
#[derive(Clone, Debug, Default)]
pub struct HashChainVerifier {
    bypass_until: Option<ConsensusTimestamp>,
}

impl HashChainVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: &HashChainConfig) -> Self {
        Self {
            bypass_until: config.bypass_until,
        }
    }

    /// End of the bypass window.
    pub fn bypass_until(&self) -> Option<ConsensusTimestamp> {
        self.bypass_until
    }

    /// Check one file, logging bypassed gaps.
    pub fn verify(
        &self,
        previous_hash: Option<&Digest>,
        last_accepted: Option<&Digest>,
        timestamp: ConsensusTimestamp,
    ) -> ChainVerdict {
        let verdict = verify_link(previous_hash, last_accepted, timestamp, self.bypass_until);
        if verdict == ChainVerdict::Bypassed {
            warn!(
                %timestamp,
                expected = ?last_accepted,
                found = ?previous_hash,
                "[mn-03] Known hash chain discontinuity bypassed"
            );
        }
        verdict
    }
}
