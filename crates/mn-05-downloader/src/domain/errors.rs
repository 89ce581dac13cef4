//! # Error Types

use mn_01_address_book::AddressBookError;
use mn_02_signature_verification::ThresholdError;
use shared_types::StreamType;
use std::time::Duration;
use thiserror::Error;

/// Object storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// No object under this key.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The call did not finish in time.
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    /// The store is temporarily unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Local or transport I/O error.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The store refused the request.
    #[error("storage access denied: {0}")]
    Denied(String),
}

impl StorageError {
    /// True if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Timeout(_) | StorageError::Unavailable(_) | StorageError::Io(_)
        )
    }
}

/// Checkpoint store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    /// Reading or writing the store failed.
    #[error("checkpoint I/O error: {0}")]
    Io(String),

    /// The stored checkpoint cannot be decoded.
    #[error("checkpoint corrupt: {0}")]
    Corrupt(String),

    /// The call did not finish in time.
    #[error("checkpoint call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors that abort a cycle.
///
/// Verification failures are not errors here; they halt the cycle and are
/// reported through `CycleOutcome::Halted`.
#[derive(Debug, Error)]
pub enum DownloaderError {
    /// Another cycle for this stream is still running.
    #[error("a {0} download cycle is already in progress")]
    CycleInProgress(StreamType),

    /// The checkpoint belongs to a different stream.
    #[error("checkpoint for {found} passed to the {expected} downloader")]
    StreamMismatch {
        /// This downloader's stream.
        expected: StreamType,
        /// The checkpoint's stream.
        found: StreamType,
    },

    /// Invalid quorum configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ThresholdError),

    /// The reader would drop the bytes the parser decodes.
    #[error("the {0} downloader must keep file bytes for the parser")]
    BytesRequired(StreamType),

    /// No usable address book.
    #[error("address book: {0}")]
    AddressBook(#[from] AddressBookError),

    /// Loading or saving the checkpoint failed.
    #[error("checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// A blocking verification task panicked or was cancelled.
    #[error("verification task failed: {0}")]
    TaskFailed(String),
}
