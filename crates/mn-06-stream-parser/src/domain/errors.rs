//! # Error Types

use mn_04_stream_reader::ReaderError;
use shared_types::StreamFilename;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a `Persister`.
#[derive(Debug, Error)]
pub enum PersistError {
    /// A record or commit arrived with no file open.
    #[error("no file transaction is open")]
    NoOpenFile,

    /// `begin_file` while another file is still open.
    #[error("file transaction already open for {0}")]
    FileAlreadyOpen(StreamFilename),

    /// Underlying I/O failed.
    #[error("persistence I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend-specific failure.
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the parser.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Items could not be decoded from the file.
    #[error("cannot read items of {name}: {source}")]
    Read {
        /// File being parsed.
        name: StreamFilename,
        /// Decode failure.
        #[source]
        source: ReaderError,
    },

    /// Every attempt failed; the last failure is attached.
    #[error("persisting {name} failed after {attempts} attempt(s): {source}")]
    Persist {
        /// File being parsed.
        name: StreamFilename,
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        #[source]
        source: PersistError,
    },

    /// Every attempt failed and the last one timed out.
    #[error("persisting {name} timed out after {attempts} attempt(s) of {timeout:?}")]
    Timeout {
        /// File being parsed.
        name: StreamFilename,
        /// Attempts made.
        attempts: u32,
        /// Per-attempt bound.
        timeout: Duration,
    },
}
