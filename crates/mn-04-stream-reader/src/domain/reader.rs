//! # Stream File Reader
//!
//! Validating decoder. A file is read in full once: every chunk is framed,
//! checksummed (V2) and decoded, items are checked for stream type and
//! order, and the content hash is computed per the version byte. Anything
//! wrong fails the whole file with a `ReaderError`.

use crate::config::ReaderConfig;
use crate::domain::cursor::Cursor;
use crate::domain::errors::ReaderError;
use crate::domain::format::{
    FormatVersion, PREV_HASH_MARKER, SIGNATURE_MARKER, VERSION_V1, VERSION_V2,
};
use crate::domain::stream_file::{decode_chunk, BodyLayout, StreamFile};
use shared_crypto::{sha384, sha384_many};
use shared_types::{ConsensusTimestamp, Digest, FileKind, StreamFilename};
use std::sync::Arc;
use tracing::debug;

/// Content hash of a file given its header and item bytes.
///
/// `header` is everything before the first chunk; `body` is the chunks,
/// excluding any trailer.
pub fn content_hash(version: FormatVersion, header: &[u8], body: &[u8]) -> Digest {
    match version {
        FormatVersion::V1 => sha384_many(&[header, sha384(body).as_bytes().as_slice()]),
        FormatVersion::V2 { .. } => sha384_many(&[header, body]),
    }
}

/// Stream file reader.
#[derive(Clone, Debug, Default)]
pub struct StreamFileReader {
    config: ReaderConfig,
}

impl StreamFileReader {
    /// Create a reader.
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Decode and validate a data file.
    ///
    /// `name` supplies the stream type (and thus the legal item marker) and
    /// the fallback consensus start for files without items.
    pub fn read(
        &self,
        name: StreamFilename,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<StreamFile, ReaderError> {
        if name.kind() != FileKind::Data {
            return Err(ReaderError::NotADataFile(name.to_string()));
        }
        let bytes: Arc<[u8]> = bytes.into();
        if bytes.is_empty() {
            return Err(ReaderError::Empty);
        }

        // Header: version byte selects the layout of everything after it.
        let mut cursor = Cursor::new(&bytes, 0);
        let version = match cursor.u8()? {
            VERSION_V1 => FormatVersion::V1,
            VERSION_V2 => FormatVersion::V2 {
                hapi_version: cursor.u32()?,
            },
            other => return Err(ReaderError::UnsupportedVersion(other)),
        };

        let marker_offset = cursor.offset();
        let marker = cursor.u8()?;
        if marker != PREV_HASH_MARKER {
            return Err(ReaderError::UnexpectedMarker {
                offset: marker_offset,
                found: marker,
            });
        }
        let previous_hash = cursor.digest()?;
        let items_start = cursor.offset();

        // Body: chunks until end of input or the signature trailer.
        let scan = BodyLayout {
            items_start,
            items_end: bytes.len(),
            chunk: version.chunk_layout(),
            stream: name.stream_type(),
            max_item_len: self.config.max_item_len,
        };
        let mut offset = items_start;
        let mut count: u64 = 0;
        let mut first: Option<ConsensusTimestamp> = None;
        let mut last: Option<ConsensusTimestamp> = None;
        let mut trailer: Option<(usize, Digest)> = None;

        while offset < bytes.len() {
            if Cursor::new(&bytes, offset).peek() == Some(SIGNATURE_MARKER) {
                let mut tail = Cursor::new(&bytes, offset + 1);
                let declared = tail.digest()?;
                if !tail.is_empty() {
                    return Err(ReaderError::TrailingData {
                        offset,
                        len: tail.remaining(),
                    });
                }
                trailer = Some((offset, declared));
                break;
            }

            let (record, next) = decode_chunk(&bytes, offset, &scan)?;
            let timestamp = record.consensus_timestamp();
            if last.is_some_and(|previous| timestamp < previous) {
                return Err(ReaderError::OutOfOrder { offset });
            }
            first.get_or_insert(timestamp);
            last = Some(timestamp);
            count += 1;
            offset = next;
        }

        let items_end = trailer.map_or(bytes.len(), |(at, _)| at);
        let hash = content_hash(
            version,
            &bytes[..items_start],
            &bytes[items_start..items_end],
        );
        if let Some((_, declared)) = trailer {
            if declared != hash {
                return Err(ReaderError::TrailerHashMismatch {
                    declared,
                    computed: hash,
                });
            }
        }

        let consensus_start = first.unwrap_or_else(|| name.timestamp());
        let consensus_end = last.unwrap_or(consensus_start);
        debug!(
            file = %name,
            version = version.number(),
            count,
            hash = %hash,
            "[mn-04] Stream file read"
        );

        let size = bytes.len();
        Ok(StreamFile {
            name,
            version,
            consensus_start,
            consensus_end,
            previous_hash,
            hash,
            count,
            size,
            bytes: self.config.keep_bytes.then_some(bytes),
            layout: BodyLayout { items_end, ..scan },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format::{DEFAULT_HAPI_VERSION, EVENT_MARKER, RECORD_MARKER};
    use crate::domain::writer::StreamFileWriter;
    use proptest::prelude::*;
    use shared_types::{
        AccountBalance, DomainRecord, EventRecord, StreamType, TransactionBody, TransactionId,
        TransactionRecord, RESULT_SUCCESS,
    };

    fn name(stream: StreamType) -> StreamFilename {
        StreamFilename::new(
            stream,
            FileKind::Data,
            ConsensusTimestamp::from_parts(1_567_188_900, 0),
        )
    }

    fn tx(nanos: i64, payer: u64) -> DomainRecord {
        DomainRecord::Transaction(TransactionRecord {
            consensus_timestamp: ConsensusTimestamp(1_567_188_900_000_000_000 + nanos),
            transaction_id: TransactionId {
                payer,
                valid_start: ConsensusTimestamp(1_567_188_890_000_000_000),
            },
            result: RESULT_SUCCESS,
            charged_fee: 100,
            memo: format!("memo {}", nanos),
            body: TransactionBody::ConsensusSubmitMessage {
                topic_id: 1001,
                sequence_number: nanos as u64,
                message: vec![nanos as u8; 16],
            },
            transaction_bytes: vec![0xCA, 0xFE],
        })
    }

    fn v2() -> FormatVersion {
        FormatVersion::V2 {
            hapi_version: DEFAULT_HAPI_VERSION,
        }
    }

    fn encode(version: FormatVersion, records: &[DomainRecord], trailer: bool) -> Vec<u8> {
        let mut writer =
            StreamFileWriter::new(StreamType::Record, version, &Digest::new([0x11; 48]));
        for record in records {
            writer.push(record).unwrap();
        }
        writer.finish(trailer).bytes
    }

    fn reader() -> StreamFileReader {
        StreamFileReader::new(ReaderConfig::for_testing())
    }

    /// Test: encoded records read back identically, with an independent hash.
    #[test]
    fn test_v2_roundtrip_and_hash() {
        let records = vec![tx(1, 2), tx(5, 3), tx(5, 4)];
        let bytes = encode(v2(), &records, false);

        let file = reader().read(name(StreamType::Record), bytes.clone()).unwrap();
        assert_eq!(file.count, 3);
        assert_eq!(file.previous_hash, Digest::new([0x11; 48]));
        assert_eq!(file.hash, sha384(&bytes));
        assert_eq!(file.consensus_start, records[0].consensus_timestamp());
        assert_eq!(file.consensus_end, records[2].consensus_timestamp());

        let read: Vec<DomainRecord> = file.items().unwrap().map(Result::unwrap).collect();
        assert_eq!(read, records);
    }

    #[test]
    fn test_v1_hash_of_hash() {
        let records = vec![tx(1, 2), tx(2, 2)];
        let bytes = encode(FormatVersion::V1, &records, false);
        let header_len = 1 + 1 + 48;

        let file = reader().read(name(StreamType::Record), bytes.clone()).unwrap();
        let expected = sha384(
            &[
                &bytes[..header_len],
                sha384(&bytes[header_len..]).as_bytes().as_slice(),
            ]
            .concat(),
        );
        assert_eq!(file.hash, expected);
        assert_eq!(file.version, FormatVersion::V1);
        assert_eq!(file.items().unwrap().count(), 2);
    }

    /// Test: the trailer is excluded from the hash and must match it.
    #[test]
    fn test_trailer_excluded_and_checked() {
        let records = vec![tx(1, 2)];
        let plain = encode(v2(), &records, false);
        let signed = encode(v2(), &records, true);
        assert_eq!(signed.len(), plain.len() + 49);

        let file = reader().read(name(StreamType::Record), signed.clone()).unwrap();
        assert_eq!(file.hash, sha384(&plain));
        assert_eq!(file.count, 1);

        let mut forged = signed;
        let last = forged.len() - 1;
        forged[last] ^= 0x01;
        assert!(matches!(
            reader().read(name(StreamType::Record), forged),
            Err(ReaderError::TrailerHashMismatch { .. })
        ));
    }

    #[test]
    fn test_data_after_trailer() {
        let mut bytes = encode(v2(), &[tx(1, 2)], true);
        bytes.push(0x02);
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::TrailingData { len: 1, .. })
        ));
    }

    #[test]
    fn test_empty_file_uses_name_timestamp() {
        let bytes = encode(v2(), &[], false);
        let file = reader().read(name(StreamType::Record), bytes).unwrap();
        assert_eq!(file.count, 0);
        assert_eq!(file.consensus_start, name(StreamType::Record).timestamp());
        assert_eq!(file.consensus_end, file.consensus_start);
        assert_eq!(file.items().unwrap().next(), None);
    }

    #[test]
    fn test_rejects_empty_and_unknown_version() {
        assert_eq!(
            reader().read(name(StreamType::Record), Vec::new()).unwrap_err(),
            ReaderError::Empty
        );
        assert_eq!(
            reader().read(name(StreamType::Record), vec![0x09, 0x01]).unwrap_err(),
            ReaderError::UnsupportedVersion(0x09)
        );
    }

    #[test]
    fn test_rejects_bad_prev_hash_marker() {
        let mut bytes = encode(FormatVersion::V1, &[], false);
        bytes[1] = 0x07;
        assert_eq!(
            reader().read(name(StreamType::Record), bytes).unwrap_err(),
            ReaderError::UnexpectedMarker {
                offset: 1,
                found: 0x07
            }
        );
    }

    #[test]
    fn test_rejects_truncation() {
        let bytes = encode(v2(), &[tx(1, 2)], false);
        for cut in [3, 20, bytes.len() - 1] {
            let result = reader().read(name(StreamType::Record), bytes[..cut].to_vec());
            assert!(
                matches!(result, Err(ReaderError::Truncated { .. })),
                "cut at {} gave {:?}",
                cut,
                result
            );
        }
    }

    #[test]
    fn test_rejects_checksum_mismatch() {
        let mut bytes = encode(v2(), &[tx(1, 2)], false);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::ChecksumMismatch { offset: 54 })
        ));
    }

    #[test]
    fn test_rejects_foreign_marker() {
        let mut bytes = encode(v2(), &[tx(1, 2)], false);
        bytes[54] = EVENT_MARKER;
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::MarkerStreamMismatch { offset: 54, .. })
        ));

        let mut bytes = encode(v2(), &[tx(1, 2)], false);
        bytes[54] = 0x7F;
        assert_eq!(
            reader().read(name(StreamType::Record), bytes).unwrap_err(),
            ReaderError::UnexpectedMarker {
                offset: 54,
                found: 0x7F
            }
        );
    }

    #[test]
    fn test_rejects_oversized_item() {
        let mut bytes = encode(FormatVersion::V1, &[tx(1, 2)], false);
        bytes[51..55].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::ItemTooLarge { offset: 50, .. })
        ));
    }

    #[test]
    fn test_rejects_undecodable_payload() {
        let mut bytes = vec![VERSION_V1, PREV_HASH_MARKER];
        bytes.extend_from_slice(&[0u8; 48]);
        bytes.push(RECORD_MARKER);
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::Decode { offset: 50, .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_order_items() {
        let bytes = encode(v2(), &[tx(9, 2), tx(3, 2)], false);
        assert!(matches!(
            reader().read(name(StreamType::Record), bytes),
            Err(ReaderError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_signature_file_name() {
        let sig = name(StreamType::Record).to_signature();
        assert!(matches!(
            reader().read(sig, encode(v2(), &[], false)),
            Err(ReaderError::NotADataFile(_))
        ));
    }

    #[test]
    fn test_event_and_balance_streams() {
        let event = DomainRecord::Event(EventRecord {
            creator_node_id: 3,
            creator_sequence: 17,
            consensus_timestamp: ConsensusTimestamp(5),
            consensus_order: 99,
            transactions: vec![vec![1, 2, 3]],
        });
        let mut writer = StreamFileWriter::new(StreamType::Event, v2(), &Digest::ZERO);
        writer.push(&event).unwrap();
        let file = reader()
            .read(name(StreamType::Event), writer.finish(false).bytes)
            .unwrap();
        assert_eq!(file.items().unwrap().next().unwrap().unwrap(), event);

        let balance = DomainRecord::Balance(AccountBalance {
            consensus_timestamp: ConsensusTimestamp(5),
            account: 2,
            balance: 10,
        });
        let mut writer = StreamFileWriter::new(StreamType::Balance, FormatVersion::V1, &Digest::ZERO);
        writer.push(&balance).unwrap();
        let bytes = writer.finish(false).bytes;

        // A balance file cannot be read as a record file.
        assert!(reader().read(name(StreamType::Record), bytes.clone()).is_err());
        assert_eq!(reader().read(name(StreamType::Balance), bytes).unwrap().count, 1);
    }

    #[test]
    fn test_items_restartable_and_droppable() {
        let records = vec![tx(1, 2), tx(2, 3)];
        let mut file = reader()
            .read(name(StreamType::Record), encode(v2(), &records, false))
            .unwrap();

        let first: Vec<_> = file.items().unwrap().collect();
        let second: Vec<_> = file.items().unwrap().collect();
        assert_eq!(first, second);

        file.drop_bytes();
        assert!(!file.has_bytes());
        assert!(matches!(file.items(), Err(ReaderError::BytesDropped)));
        assert_eq!(file.count, 2);
    }

    #[test]
    fn test_keep_bytes_disabled() {
        let config = ReaderConfig {
            keep_bytes: false,
            ..ReaderConfig::for_testing()
        };
        let file = StreamFileReader::new(config)
            .read(name(StreamType::Record), encode(v2(), &[tx(1, 2)], false))
            .unwrap();
        assert!(file.bytes().is_none());
        assert_eq!(file.metadata().count, 1);
    }

    proptest! {
        /// Test: any single-byte change either fails to read or changes the hash.
        #[test]
        fn prop_single_byte_mutation(index in any::<prop::sample::Index>(), flip in 1u8..=255) {
            let bytes = encode(v2(), &[tx(1, 2), tx(2, 3)], false);
            let original = reader().read(name(StreamType::Record), bytes.clone()).unwrap();

            let mut mutated = bytes;
            let i = index.index(mutated.len());
            mutated[i] ^= flip;
            if let Ok(file) = reader().read(name(StreamType::Record), mutated) {
                prop_assert_ne!(file.hash, original.hash);
            }
        }
    }
}
