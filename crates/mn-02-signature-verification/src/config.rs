//! # Signature Verification Configuration

use crate::domain::errors::ThresholdError;
use crate::domain::quorum::QuorumThreshold;
use serde::{Deserialize, Serialize};

/// Signature verification configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignatureVerificationConfig {
    /// Quorum fraction numerator.
    pub quorum_numerator: u64,

    /// Quorum fraction denominator.
    pub quorum_denominator: u64,

    /// Candidate sets smaller than this are verified on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for SignatureVerificationConfig {
    fn default() -> Self {
        Self {
            quorum_numerator: 1,
            quorum_denominator: 3,
            parallel_threshold: 4,
        }
    }
}

impl SignatureVerificationConfig {
    /// Create a config for testing (always parallel).
    pub fn for_testing() -> Self {
        Self {
            parallel_threshold: 0,
            ..Self::default()
        }
    }

    /// The configured quorum fraction.
    pub fn threshold(&self) -> Result<QuorumThreshold, ThresholdError> {
        QuorumThreshold::new(self.quorum_numerator, self.quorum_denominator)
    }
}
