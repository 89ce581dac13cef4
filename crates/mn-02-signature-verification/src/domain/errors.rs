//! # Signature Errors
//!
//! Error types for signature file decoding and quorum configuration.

use thiserror::Error;

/// Errors decoding a signature file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureFileError {
    /// Input ended early.
    #[error("Signature file truncated: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Offset where the read started
        offset: usize,
        /// Bytes missing
        needed: usize,
    },

    /// A marker byte was not the one required at this position.
    #[error("Unexpected marker {found:#04x} at offset {offset}, expected {expected:#04x}")]
    UnexpectedMarker {
        /// Offset of the marker
        offset: usize,
        /// Required marker
        expected: u8,
        /// Marker found
        found: u8,
    },

    /// Signature type byte not recognised.
    #[error("Unknown signature type: {0:#04x}")]
    UnknownSignatureType(u8),

    /// Declared signature length is out of bounds.
    #[error("Invalid signature length: {0}")]
    InvalidSignatureLength(u32),

    /// Bytes remain after the signature.
    #[error("{0} trailing bytes after signature")]
    TrailingBytes(usize),
}

/// Invalid quorum fraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThresholdError {
    /// Denominator is zero.
    #[error("Quorum denominator must be positive")]
    ZeroDenominator,

    /// Fraction is not below one; a strict majority of it can never be met.
    #[error("Quorum fraction {numerator}/{denominator} must be below 1")]
    Unreachable {
        /// Numerator
        numerator: u64,
        /// Denominator
        denominator: u64,
    },
}
