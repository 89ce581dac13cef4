//! # Error Types
//!
//! Parse errors for the shared value types.

use thiserror::Error;

/// Errors building a `Digest`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DigestError {
    /// Wrong number of bytes.
    #[error("Invalid digest length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Not valid hex.
    #[error("Invalid digest hex: {0}")]
    InvalidHex(String),
}

/// Errors parsing or rendering a `StreamFilename`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilenameError {
    /// No `.` separating instant and extension.
    #[error("Stream file name has no extension: {0}")]
    MissingExtension(String),

    /// Extension does not belong to any stream type.
    #[error("Unknown stream file extension: {0}")]
    UnknownExtension(String),

    /// Instant part does not parse.
    #[error("Invalid stream file timestamp: {0}")]
    InvalidTimestamp(String),

    /// Parses, but does not render back to the same name.
    #[error("Non-canonical stream file name: {0}")]
    NonCanonical(String),

    /// Timestamp cannot be represented as a calendar date.
    #[error("Timestamp out of range: {0} ns")]
    TimestampOutOfRange(i64),
}
