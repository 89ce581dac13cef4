//! # Stream File
//!
//! The decoded form of a data file. Record, event and balance files share
//! one shape; the stream type comes from the file name and each item is a
//! tagged `DomainRecord`.
//!
//! Items are not held in memory. `items()` re-decodes them from the raw
//! bytes on every call, so the sequence is finite, ordered and restartable.

use crate::domain::cursor::Cursor;
use crate::domain::errors::ReaderError;
use crate::domain::format::{
    decode_payload, item_marker, stream_of_marker, ChunkLayout, FormatVersion,
};
use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, Digest, DomainRecord, StreamFilename, StreamType};
use std::sync::Arc;

/// Where the items live and how they are framed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BodyLayout {
    pub(crate) items_start: usize,
    pub(crate) items_end: usize,
    pub(crate) chunk: ChunkLayout,
    pub(crate) stream: StreamType,
    pub(crate) max_item_len: usize,
}

/// Decode the chunk at `offset`; returns the record and the next offset.
pub(crate) fn decode_chunk(
    bytes: &[u8],
    offset: usize,
    layout: &BodyLayout,
) -> Result<(DomainRecord, usize), ReaderError> {
    let mut cursor = Cursor::new(&bytes[..layout.items_end], offset);

    let marker = cursor.u8()?;
    if marker != item_marker(layout.stream) {
        return Err(match stream_of_marker(marker) {
            Some(_) => ReaderError::MarkerStreamMismatch {
                offset,
                marker,
                stream: layout.stream,
            },
            None => ReaderError::UnexpectedMarker {
                offset,
                found: marker,
            },
        });
    }

    let len = cursor.u32()? as usize;
    if len > layout.max_item_len {
        return Err(ReaderError::ItemTooLarge {
            offset,
            len,
            max: layout.max_item_len,
        });
    }
    let payload = cursor.take(len)?;

    if layout.chunk == ChunkLayout::Checksummed {
        let declared = cursor.u32()?;
        if crc32fast::hash(payload) != declared {
            return Err(ReaderError::ChecksumMismatch { offset });
        }
    }

    let record = decode_payload(payload, offset, layout.max_item_len)?;
    if record.stream_type() != layout.stream {
        return Err(ReaderError::RecordTypeMismatch {
            offset,
            expected: layout.stream,
            found: record.stream_type(),
        });
    }

    Ok((record, cursor.offset()))
}

/// A verified-readable stream file.
#[derive(Clone, Debug)]
pub struct StreamFile {
    /// Data file name; carries stream type and consensus timestamp.
    pub name: StreamFilename,
    /// On-disk format version.
    pub version: FormatVersion,
    /// Timestamp of the first item, or of the name if there are none.
    pub consensus_start: ConsensusTimestamp,
    /// Timestamp of the last item.
    pub consensus_end: ConsensusTimestamp,
    /// Hash the file embeds for its predecessor.
    pub previous_hash: Digest,
    /// This file's own content hash.
    pub hash: Digest,
    /// Number of items.
    pub count: u64,
    /// Raw size in bytes.
    pub size: usize,
    pub(crate) bytes: Option<Arc<[u8]>>,
    pub(crate) layout: BodyLayout,
}

impl StreamFile {
    /// Stream type of the file.
    pub fn stream_type(&self) -> StreamType {
        self.name.stream_type()
    }

    /// Raw bytes, if still held.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// True if `items()` can be called.
    pub fn has_bytes(&self) -> bool {
        self.bytes.is_some()
    }

    /// Release the raw bytes. Items can no longer be read afterwards.
    pub fn drop_bytes(&mut self) {
        self.bytes = None;
    }

    /// A fresh iterator over the items in file order.
    ///
    /// # Errors
    /// * `ReaderError::BytesDropped` - raw bytes were released
    pub fn items(&self) -> Result<StreamItems, ReaderError> {
        let bytes = self.bytes.clone().ok_or(ReaderError::BytesDropped)?;
        Ok(StreamItems {
            bytes,
            layout: self.layout,
            offset: self.layout.items_start,
            remaining: self.count,
            failed: false,
        })
    }

    /// Summary passed to persistence.
    pub fn metadata(&self) -> StreamFileMetadata {
        StreamFileMetadata {
            name: self.name,
            stream_type: self.stream_type(),
            version: self.version.number(),
            hapi_version: match self.version {
                FormatVersion::V1 => None,
                FormatVersion::V2 { hapi_version } => Some(hapi_version),
            },
            consensus_start: self.consensus_start,
            consensus_end: self.consensus_end,
            previous_hash: self.previous_hash,
            hash: self.hash,
            count: self.count,
            size: self.size,
        }
    }
}

/// Restartable iterator over a stream file's items.
pub struct StreamItems {
    bytes: Arc<[u8]>,
    layout: BodyLayout,
    offset: usize,
    remaining: u64,
    failed: bool,
}

impl Iterator for StreamItems {
    type Item = Result<DomainRecord, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.layout.items_end {
            return None;
        }
        match decode_chunk(&self.bytes, self.offset, &self.layout) {
            Ok((record, next)) => {
                self.offset = next;
                self.remaining = self.remaining.saturating_sub(1);
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

/// File-level facts handed to the persister alongside the items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFileMetadata {
    /// Data file name.
    pub name: StreamFilename,
    /// Stream type.
    pub stream_type: StreamType,
    /// Format version number.
    pub version: u8,
    /// Producer API version (V2 only).
    pub hapi_version: Option<u32>,
    /// First item timestamp.
    pub consensus_start: ConsensusTimestamp,
    /// Last item timestamp.
    pub consensus_end: ConsensusTimestamp,
    /// Embedded previous hash.
    pub previous_hash: Digest,
    /// Content hash.
    pub hash: Digest,
    /// Item count.
    pub count: u64,
    /// Raw size in bytes.
    pub size: usize,
}
