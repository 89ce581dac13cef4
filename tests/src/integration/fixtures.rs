//! # Test Fixtures
//!
//! A simulated consensus network: node keys, an address book, an object
//! store the nodes publish into, and helpers to build a downloader over it.

use mn_01_address_book::{AddressBook, AddressBookConfig, AddressBookEntry, AddressBookService};
use mn_02_signature_verification::SignatureFile;
use mn_04_stream_reader::{EncodedStreamFile, FormatVersion, StreamFileWriter};
use mn_05_downloader::{
    CheckpointStore, Downloader, DownloaderConfig, InMemoryCheckpointStore, InMemoryStorage,
    RecordingListener, StreamListener,
};
use mn_06_stream_parser::{ParserConfig, Persister, StreamFileParser};
use shared_crypto::NodeKeyPair;
use shared_types::{
    AccountBalance, ConsensusTimestamp, Digest, DomainRecord, EntityNum, EventRecord, FileKind,
    NodeId, StreamFilename, StreamType, TransactionBody, TransactionId, TransactionRecord,
    Transfer, RESULT_SUCCESS,
};
use std::sync::Arc;

/// 2019-08-30T18:15:00Z
pub const T0: i64 = 1_567_188_900;

/// Downloader over the simulated network.
pub type TestDownloader = Downloader<InMemoryStorage, AddressBookService>;

/// Name of the `i`-th data file of `stream`, two seconds apart.
pub fn name_at(stream: StreamType, i: i64) -> StreamFilename {
    StreamFilename::new(
        stream,
        FileKind::Data,
        ConsensusTimestamp::from_parts(T0 + 2 * i, 0),
    )
}

fn transaction(timestamp: ConsensusTimestamp, body: TransactionBody) -> DomainRecord {
    DomainRecord::Transaction(TransactionRecord {
        consensus_timestamp: timestamp,
        transaction_id: TransactionId {
            payer: 2,
            valid_start: ConsensusTimestamp::from_parts(timestamp.seconds() - 5, 0),
        },
        result: RESULT_SUCCESS,
        charged_fee: 10,
        memo: String::new(),
        body,
        transaction_bytes: vec![0xAB; 8],
    })
}

/// A crypto transfer at `timestamp`.
pub fn transfer(timestamp: ConsensusTimestamp, amount: i64) -> DomainRecord {
    transaction(
        timestamp,
        TransactionBody::CryptoTransfer {
            transfers: vec![
                Transfer {
                    account: 2,
                    amount: -amount,
                },
                Transfer {
                    account: 98,
                    amount,
                },
            ],
        },
    )
}

/// A file update, or append, of `file_id`.
pub fn file_write(
    timestamp: ConsensusTimestamp,
    file_id: EntityNum,
    contents: &[u8],
    append: bool,
) -> DomainRecord {
    let contents = contents.to_vec();
    let body = if append {
        TransactionBody::FileAppend { file_id, contents }
    } else {
        TransactionBody::FileUpdate { file_id, contents }
    };
    transaction(timestamp, body)
}

/// Records the `i`-th file of `stream` carries by default.
pub fn records_at(stream: StreamType, i: i64) -> Vec<DomainRecord> {
    let seconds = T0 + 2 * i;
    (0..3u32)
        .map(|nanos| {
            let timestamp = ConsensusTimestamp::from_parts(seconds, nanos);
            match stream {
                StreamType::Balance => DomainRecord::Balance(AccountBalance {
                    consensus_timestamp: timestamp,
                    account: 2 + nanos as u64,
                    balance: 1_000 * (i + 1),
                }),
                StreamType::Event => DomainRecord::Event(EventRecord {
                    creator_node_id: nanos as NodeId,
                    creator_sequence: i as u64,
                    consensus_timestamp: timestamp,
                    consensus_order: (3 * i) as u64 + nanos as u64,
                    transactions: vec![vec![nanos as u8; 4]],
                }),
                StreamType::Record => transfer(timestamp, nanos as i64 + 1),
            }
        })
        .collect()
}

/// Encode `records` as a V2 file linked to `previous`.
pub fn encode(stream: StreamType, records: &[DomainRecord], previous: &Digest) -> EncodedStreamFile {
    let mut writer = StreamFileWriter::new(stream, FormatVersion::V2 { hapi_version: 1 }, previous);
    writer.extend(records).expect("records match the stream");
    writer.finish(false)
}

/// Simulated consensus network.
pub struct Network {
    /// Node keys; the address book covers a prefix of them.
    pub keys: Vec<NodeKeyPair>,
    /// Bucket the nodes publish into.
    pub storage: Arc<InMemoryStorage>,
    /// Current address book.
    pub address_book: Arc<AddressBookService>,
    /// Checkpoints of every stream.
    pub checkpoints: Arc<InMemoryCheckpointStore>,
    /// Callback recorder.
    pub listener: Arc<RecordingListener>,
}

impl Network {
    /// Nodes `0..stakes.len()` with the given stakes. Odd nodes sign with
    /// secp256k1, even ones with Ed25519.
    pub fn new(stakes: &[u64]) -> Self {
        Self::with_spare_keys(stakes, 0)
    }

    /// Like `new`, with `spare` extra keys outside the address book.
    pub fn with_spare_keys(stakes: &[u64], spare: usize) -> Self {
        let keys: Vec<_> = (0..stakes.len() + spare)
            .map(|n| {
                let seed = [n as u8 + 1; 32];
                if n % 2 == 1 {
                    NodeKeyPair::secp256k1_from_bytes(seed).expect("valid scalar")
                } else {
                    NodeKeyPair::ed25519_from_seed(seed)
                }
            })
            .collect();
        let network = Self {
            keys,
            storage: Arc::new(InMemoryStorage::new()),
            address_book: Arc::new(AddressBookService::new(AddressBookConfig::default())),
            checkpoints: Arc::new(InMemoryCheckpointStore::new()),
            listener: Arc::new(RecordingListener::new()),
        };
        network
            .address_book
            .replace(network.book(stakes));
        network
    }

    /// Address book over nodes `0..stakes.len()`.
    pub fn book(&self, stakes: &[u64]) -> AddressBook {
        AddressBook::new(
            stakes
                .iter()
                .enumerate()
                .map(|(n, stake)| {
                    AddressBookEntry::new(n as NodeId, self.keys[n].public_key_bytes(), *stake)
                })
                .collect(),
        )
        .expect("valid address book")
    }

    /// Encoded signature file of `node_id` over `hash`.
    pub fn signature(&self, node_id: NodeId, hash: &Digest) -> Vec<u8> {
        let key = &self.keys[node_id as usize];
        SignatureFile {
            node_id,
            file_hash: *hash,
            signature: key.sign(hash.as_bytes()),
            scheme: key.scheme(),
        }
        .encode()
    }

    /// Publish the data file on every signer, with its signature.
    pub fn publish(&self, name: StreamFilename, file: &EncodedStreamFile, signers: &[NodeId]) {
        for &node_id in signers {
            self.storage.publish(node_id, &name, file.bytes.clone());
            self.storage
                .publish(node_id, &name.to_signature(), self.signature(node_id, &file.hash));
        }
    }

    /// Publish `count` linked default files of `stream` from index `from`,
    /// signed by `signers`. Returns them in order.
    pub fn publish_chain(
        &self,
        stream: StreamType,
        from: i64,
        count: i64,
        previous: Digest,
        signers: &[NodeId],
    ) -> Vec<EncodedStreamFile> {
        let mut previous = previous;
        (from..from + count)
            .map(|i| {
                let file = encode(stream, &records_at(stream, i), &previous);
                self.publish(name_at(stream, i), &file, signers);
                previous = file.hash;
                file
            })
            .collect()
    }

    /// Downloader for `config.stream_type` persisting into `persister`.
    pub fn downloader<P: Persister + 'static>(
        &self,
        config: DownloaderConfig,
        persister: Arc<P>,
    ) -> TestDownloader {
        let parser = StreamFileParser::new(ParserConfig::for_testing(), persister);
        Downloader::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.address_book),
            Arc::new(parser),
            Arc::clone(&self.checkpoints) as Arc<dyn CheckpointStore>,
        )
        .expect("valid downloader config")
        .with_listener(Arc::clone(&self.listener) as Arc<dyn StreamListener>)
    }
}
