//! # Quorum Arithmetic
//!
//! Strict "more than a fraction" comparison, done in `u128` so stake sums
//! near `u64::MAX` cannot overflow.

use crate::domain::errors::ThresholdError;

/// A fraction of total stake that must be strictly exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumThreshold {
    numerator: u64,
    denominator: u64,
}

impl QuorumThreshold {
    /// More than one third of stake.
    pub const ONE_THIRD: QuorumThreshold = QuorumThreshold {
        numerator: 1,
        denominator: 3,
    };

    /// Build a threshold; requires `0 <= numerator < denominator`.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, ThresholdError> {
        if denominator == 0 {
            return Err(ThresholdError::ZeroDenominator);
        }
        if numerator >= denominator {
            return Err(ThresholdError::Unreachable {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Numerator.
    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Denominator.
    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// True iff `valid / total > numerator / denominator`.
    pub fn is_met(&self, valid: u64, total: u64) -> bool {
        if total == 0 {
            return false;
        }
        u128::from(valid) * u128::from(self.denominator)
            > u128::from(total) * u128::from(self.numerator)
    }
}

impl Default for QuorumThreshold {
    fn default() -> Self {
        Self::ONE_THIRD
    }
}
