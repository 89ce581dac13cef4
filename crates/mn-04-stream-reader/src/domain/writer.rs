//! # Stream File Writer
//!
//! Encoder for the same format the reader accepts. Used to build fixtures
//! and to re-publish files in tests; the output hash is computed with the
//! reader's `content_hash`.

use crate::domain::errors::ReaderError;
use crate::domain::format::{
    encode_payload, item_marker, ChunkLayout, FormatVersion, MAX_ITEM_LEN, PREV_HASH_MARKER,
    SIGNATURE_MARKER,
};
use crate::domain::reader::content_hash;
use shared_types::{Digest, DomainRecord, StreamType};

/// Output of `StreamFileWriter::finish`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStreamFile {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Content hash (excluding any trailer).
    pub hash: Digest,
    /// Number of items written.
    pub count: u64,
}

/// Incremental stream file encoder.
pub struct StreamFileWriter {
    stream: StreamType,
    version: FormatVersion,
    header: Vec<u8>,
    body: Vec<u8>,
    count: u64,
    max_item_len: usize,
}

impl StreamFileWriter {
    /// Start a file of `stream` linked to `previous_hash`.
    pub fn new(stream: StreamType, version: FormatVersion, previous_hash: &Digest) -> Self {
        let mut header = vec![version.marker()];
        if let FormatVersion::V2 { hapi_version } = version {
            header.extend_from_slice(&hapi_version.to_be_bytes());
        }
        header.push(PREV_HASH_MARKER);
        header.extend_from_slice(previous_hash.as_bytes());

        Self {
            stream,
            version,
            header,
            body: Vec::new(),
            count: 0,
            max_item_len: MAX_ITEM_LEN,
        }
    }

    /// Override the payload limit.
    pub fn with_max_item_len(mut self, max_item_len: usize) -> Self {
        self.max_item_len = max_item_len;
        self
    }

    /// Append one record.
    pub fn push(&mut self, record: &DomainRecord) -> Result<&mut Self, ReaderError> {
        let offset = self.header.len() + self.body.len();
        if record.stream_type() != self.stream {
            return Err(ReaderError::RecordTypeMismatch {
                offset,
                expected: self.stream,
                found: record.stream_type(),
            });
        }

        let payload = encode_payload(record, usize::MAX)?;
        if payload.len() > self.max_item_len {
            return Err(ReaderError::ItemTooLarge {
                offset,
                len: payload.len(),
                max: self.max_item_len,
            });
        }

        self.body.push(item_marker(self.stream));
        self.body
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.body.extend_from_slice(&payload);
        if self.version.chunk_layout() == ChunkLayout::Checksummed {
            self.body
                .extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        }
        self.count += 1;
        Ok(self)
    }

    /// Append every record in order.
    pub fn extend<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a DomainRecord>,
    ) -> Result<(), ReaderError> {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    /// Finish the file, optionally appending the signature trailer.
    pub fn finish(self, with_trailer: bool) -> EncodedStreamFile {
        let hash = content_hash(self.version, &self.header, &self.body);
        let mut bytes = self.header;
        bytes.extend_from_slice(&self.body);
        if with_trailer {
            bytes.push(SIGNATURE_MARKER);
            bytes.extend_from_slice(hash.as_bytes());
        }
        EncodedStreamFile {
            bytes,
            hash,
            count: self.count,
        }
    }
}
