//! # Reader Errors
//!
//! Every variant means the input is not a valid stream file. Offsets are
//! byte positions in the raw file.

use shared_types::{Digest, StreamType};
use thiserror::Error;

/// Invalid stream file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    /// Zero-length input.
    #[error("Invalid stream file: empty")]
    Empty,

    /// Leading version byte not recognised.
    #[error("Invalid stream file: unsupported version marker {0:#04x}")]
    UnsupportedVersion(u8),

    /// Input ended inside a field.
    #[error("Invalid stream file: truncated at offset {offset}, {needed} more bytes needed")]
    Truncated {
        /// Offset of the incomplete field
        offset: usize,
        /// Bytes missing
        needed: usize,
    },

    /// A marker byte that cannot appear here.
    #[error("Invalid stream file: unexpected marker {found:#04x} at offset {offset}")]
    UnexpectedMarker {
        /// Offset of the marker
        offset: usize,
        /// Marker found
        found: u8,
    },

    /// An item marker that belongs to another stream type.
    #[error("Invalid stream file: marker {marker:#04x} at offset {offset} is not valid in a {stream} file")]
    MarkerStreamMismatch {
        /// Offset of the marker
        offset: usize,
        /// Marker found
        marker: u8,
        /// Stream type of the file
        stream: StreamType,
    },

    /// Declared payload length exceeds the limit.
    #[error("Invalid stream file: item at offset {offset} declares {len} bytes, limit {max}")]
    ItemTooLarge {
        /// Offset of the chunk
        offset: usize,
        /// Declared length
        len: usize,
        /// Configured limit
        max: usize,
    },

    /// V2 chunk checksum mismatch.
    #[error("Invalid stream file: checksum mismatch for item at offset {offset}")]
    ChecksumMismatch {
        /// Offset of the chunk
        offset: usize,
    },

    /// Payload did not decode.
    #[error("Invalid stream file: item at offset {offset} failed to decode: {message}")]
    Decode {
        /// Offset of the chunk
        offset: usize,
        /// Decoder message
        message: String,
    },

    /// A decoded record of the wrong kind for the stream.
    #[error("Invalid stream file: item at offset {offset} is a {found} record in a {expected} file")]
    RecordTypeMismatch {
        /// Offset of the chunk
        offset: usize,
        /// Stream type of the file
        expected: StreamType,
        /// Stream type of the record
        found: StreamType,
    },

    /// Items are not in consensus order.
    #[error("Invalid stream file: item at offset {offset} precedes its predecessor in consensus order")]
    OutOfOrder {
        /// Offset of the chunk
        offset: usize,
    },

    /// Bytes follow the signature trailer.
    #[error("Invalid stream file: {len} bytes after the trailer at offset {offset}")]
    TrailingData {
        /// Offset of the trailer
        offset: usize,
        /// Excess bytes
        len: usize,
    },

    /// Trailer digest differs from the computed content hash.
    #[error("Invalid stream file: trailer hash {declared} does not match content hash {computed}")]
    TrailerHashMismatch {
        /// Digest in the trailer
        declared: Digest,
        /// Computed content hash
        computed: Digest,
    },

    /// The file name names a signature file, not a data file.
    #[error("Invalid stream file: {0} is not a data file name")]
    NotADataFile(String),

    /// Items were requested after the raw bytes were dropped.
    #[error("Stream file bytes were dropped; items cannot be re-read")]
    BytesDropped,

    /// A record could not be encoded.
    #[error("Failed to encode stream item: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_error() {
        let err = ReaderError::UnsupportedVersion(0x09);
        assert!(err.to_string().contains("0x09"));
    }

    #[test]
    fn test_marker_mismatch_error() {
        let err = ReaderError::MarkerStreamMismatch {
            offset: 53,
            marker: 0x05,
            stream: StreamType::Record,
        };
        let message = err.to_string();
        assert!(message.contains("0x05"));
        assert!(message.contains("record"));
    }
}
