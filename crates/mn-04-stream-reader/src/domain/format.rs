//! # Wire Format
//!
//! Markers, versions and the per-version chunk layout.

use crate::domain::errors::ReaderError;
use bincode::Options;
use serde::{Deserialize, Serialize};
use shared_types::{DomainRecord, StreamType};

/// V1 (legacy) version byte.
pub const VERSION_V1: u8 = 0x01;

/// V2 version byte.
pub const VERSION_V2: u8 = 0x02;

/// Marker preceding the previous file hash.
pub const PREV_HASH_MARKER: u8 = 0x01;

/// Record item marker.
pub const RECORD_MARKER: u8 = 0x02;

/// Trailing signature marker; excluded from the content hash.
pub const SIGNATURE_MARKER: u8 = 0x03;

/// Event item marker.
pub const EVENT_MARKER: u8 = 0x05;

/// Balance item marker.
pub const BALANCE_MARKER: u8 = 0x06;

/// Default payload limit.
pub const MAX_ITEM_LEN: usize = 16 * 1024 * 1024;

/// HAPI version written by default into V2 headers.
pub const DEFAULT_HAPI_VERSION: u32 = 1;

/// On-disk format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Legacy: plain chunks, hash-of-hash content digest.
    V1,
    /// Checksummed chunks, flat content digest.
    V2 {
        /// API version of the producing node.
        hapi_version: u32,
    },
}

impl FormatVersion {
    /// Version byte.
    pub fn marker(&self) -> u8 {
        match self {
            FormatVersion::V1 => VERSION_V1,
            FormatVersion::V2 { .. } => VERSION_V2,
        }
    }

    /// Chunk layout this version uses.
    pub fn chunk_layout(&self) -> ChunkLayout {
        match self {
            FormatVersion::V1 => ChunkLayout::Plain,
            FormatVersion::V2 { .. } => ChunkLayout::Checksummed,
        }
    }

    /// Numeric version, for metadata.
    pub fn number(&self) -> u8 {
        self.marker()
    }
}

/// How an item chunk is framed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkLayout {
    /// `marker | u32 len | payload`
    Plain,
    /// `marker | u32 len | payload | u32 crc32`
    Checksummed,
}

impl ChunkLayout {
    /// Framing bytes around a payload.
    pub fn overhead(&self) -> usize {
        match self {
            ChunkLayout::Plain => 1 + 4,
            ChunkLayout::Checksummed => 1 + 4 + 4,
        }
    }
}

/// Item marker a stream type uses.
pub fn item_marker(stream: StreamType) -> u8 {
    match stream {
        StreamType::Record => RECORD_MARKER,
        StreamType::Event => EVENT_MARKER,
        StreamType::Balance => BALANCE_MARKER,
    }
}

/// Stream type an item marker belongs to, if any.
pub fn stream_of_marker(marker: u8) -> Option<StreamType> {
    match marker {
        RECORD_MARKER => Some(StreamType::Record),
        EVENT_MARKER => Some(StreamType::Event),
        BALANCE_MARKER => Some(StreamType::Balance),
        _ => None,
    }
}

fn payload_options(limit: usize) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .with_limit(limit as u64)
}

/// Encode a record payload.
pub fn encode_payload(record: &DomainRecord, limit: usize) -> Result<Vec<u8>, ReaderError> {
    payload_options(limit)
        .serialize(record)
        .map_err(|e| ReaderError::Encode(e.to_string()))
}

/// Decode a record payload found at `offset`.
pub fn decode_payload(
    payload: &[u8],
    offset: usize,
    limit: usize,
) -> Result<DomainRecord, ReaderError> {
    payload_options(limit)
        .deserialize(payload)
        .map_err(|e| ReaderError::Decode {
            offset,
            message: e.to_string(),
        })
}
