//! # Stream Format Properties
//!
//! Writer and reader agree on every stream type and version, and hash
//! linkage behaves as the chain verifier expects.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{encode, name_at, records_at};
    use mn_03_hash_chain::{verify_sequence, ChainLink, ChainVerdict};
    use mn_04_stream_reader::{FormatVersion, ReaderConfig, StreamFileReader, StreamFileWriter};
    use proptest::prelude::*;
    use shared_crypto::sha384;
    use shared_types::{Digest, DomainRecord, StreamType};

    fn reader() -> StreamFileReader {
        StreamFileReader::new(ReaderConfig::default())
    }

    fn read_records(stream: StreamType, i: i64, bytes: Vec<u8>) -> (Digest, Vec<DomainRecord>) {
        let file = reader().read(name_at(stream, i), bytes).unwrap();
        let records = file.items().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        (file.hash, records)
    }

    #[test]
    fn test_default_records_belong_to_their_stream() {
        for stream in StreamType::ALL {
            let records = records_at(stream, 0);
            assert!(!records.is_empty());
            assert!(records.iter().all(|r| r.stream_type() == stream));
        }
    }

    #[test]
    fn test_v2_round_trip_all_streams() {
        for stream in StreamType::ALL {
            let records = records_at(stream, 4);
            let encoded = encode(stream, &records, &Digest::new([7; 48]));

            let (hash, decoded) = read_records(stream, 4, encoded.bytes.clone());
            assert_eq!(decoded, records);
            assert_eq!(hash, encoded.hash);
            assert_eq!(hash, sha384(&encoded.bytes));
        }
    }

    #[test]
    fn test_v1_round_trip_uses_hash_of_hash() {
        let stream = StreamType::Record;
        let records = records_at(stream, 0);
        let mut writer = StreamFileWriter::new(stream, FormatVersion::V1, &Digest::ZERO);
        writer.extend(&records).unwrap();
        let encoded = writer.finish(false);

        // version | PREV_HASH marker | 48-byte hash
        let (header, body) = encoded.bytes.split_at(1 + 1 + 48);
        let mut outer = header.to_vec();
        outer.extend_from_slice(sha384(body).as_bytes());

        let (hash, decoded) = read_records(stream, 0, encoded.bytes.clone());
        assert_eq!(decoded, records);
        assert_eq!(hash, sha384(&outer));
        assert_ne!(hash, sha384(&encoded.bytes));
    }

    #[test]
    fn test_trailer_matches_content_hash() {
        let stream = StreamType::Balance;
        let mut writer =
            StreamFileWriter::new(stream, FormatVersion::V2 { hapi_version: 3 }, &Digest::ZERO);
        writer.extend(&records_at(stream, 1)).unwrap();
        let with_trailer = writer.finish(true);

        let file = reader().read(name_at(stream, 1), with_trailer.bytes.clone()).unwrap();
        assert_eq!(file.hash, with_trailer.hash);
        assert_eq!(file.count, 3);

        let mut forged = with_trailer.bytes;
        let last = forged.len() - 1;
        forged[last] ^= 0xFF;
        assert!(reader().read(name_at(stream, 1), forged).is_err());
    }

    #[test]
    fn test_items_restart_from_the_same_bytes() {
        let stream = StreamType::Event;
        let encoded = encode(stream, &records_at(stream, 2), &Digest::ZERO);
        let file = reader().read(name_at(stream, 2), encoded.bytes).unwrap();

        let first: Vec<_> = file.items().unwrap().map(Result::unwrap).collect();
        let second: Vec<_> = file.items().unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any single-byte change is either rejected or changes the hash.
        #[test]
        fn prop_single_byte_mutation_changes_hash(index in any::<prop::sample::Index>(), flip in 1u8..=255) {
            let stream = StreamType::Record;
            let encoded = encode(stream, &records_at(stream, 0), &Digest::new([3; 48]));
            let mut bytes = encoded.bytes.clone();
            let at = index.index(bytes.len());
            bytes[at] ^= flip;

            if let Ok(file) = reader().read(name_at(stream, 0), bytes) {
                prop_assert_ne!(file.hash, encoded.hash);
            }
        }

        /// N consistently linked files verify as genesis then continuous.
        #[test]
        fn prop_linked_files_are_continuous(count in 1i64..12) {
            let stream = StreamType::Balance;
            let mut previous = Digest::ZERO;
            let mut links = Vec::new();
            for i in 0..count {
                let encoded = encode(stream, &records_at(stream, i), &previous);
                let file = reader().read(name_at(stream, i), encoded.bytes).unwrap();
                links.push(ChainLink {
                    timestamp: file.consensus_start,
                    previous_hash: file.previous_hash,
                    hash: file.hash,
                });
                previous = file.hash;
            }

            let verdicts = verify_sequence(&links, None, None).unwrap();
            prop_assert_eq!(verdicts[0], ChainVerdict::Genesis);
            prop_assert!(verdicts[1..].iter().all(|v| *v == ChainVerdict::Continuous));
        }
    }
}
