//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`, `EntityNum`
//! - **Chain bookkeeping**: `LastValidCheckpoint`
//! - **Stream content**: `DomainRecord` and the per-stream record payloads

use crate::digest::Digest;
use crate::stream::{StreamFilename, StreamType};
use crate::timestamp::ConsensusTimestamp;
use serde::{Deserialize, Serialize};

/// Identifier of a consensus node in the address book.
pub type NodeId = u64;

/// Number of a ledger entity (account, topic, file) within the default realm.
pub type EntityNum = u64;

/// Response code written for successful transactions.
pub const RESULT_SUCCESS: u32 = 22;

// =============================================================================
// CLUSTER A: CHAIN BOOKKEEPING
// =============================================================================

/// Pointer to the last file that passed verification and was durably
/// persisted. One per stream type; the only long-lived state the importer
/// owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastValidCheckpoint {
    /// Name of the data file.
    pub file_name: StreamFilename,
    /// That file's own content hash, which the next file must link to.
    pub file_hash: Digest,
}

impl LastValidCheckpoint {
    /// Create a checkpoint.
    pub fn new(file_name: StreamFilename, file_hash: Digest) -> Self {
        Self {
            file_name,
            file_hash,
        }
    }

    /// Stream this checkpoint belongs to.
    pub fn stream_type(&self) -> StreamType {
        self.file_name.stream_type()
    }

    /// Consensus timestamp of the checkpointed file.
    pub fn timestamp(&self) -> ConsensusTimestamp {
        self.file_name.timestamp()
    }
}

// =============================================================================
// CLUSTER B: STREAM CONTENT
// =============================================================================

/// One unit decoded from a stream file.
///
/// Immutable once produced; ownership moves to the persister on emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainRecord {
    /// A transaction and its record, from a record stream.
    Transaction(TransactionRecord),
    /// A consensus event, from an event stream.
    Event(EventRecord),
    /// An account balance, from a balance stream.
    Balance(AccountBalance),
}

impl DomainRecord {
    /// Consensus timestamp of the record.
    pub fn consensus_timestamp(&self) -> ConsensusTimestamp {
        match self {
            DomainRecord::Transaction(tx) => tx.consensus_timestamp,
            DomainRecord::Event(event) => event.consensus_timestamp,
            DomainRecord::Balance(balance) => balance.consensus_timestamp,
        }
    }

    /// Stream type that carries this kind of record.
    pub fn stream_type(&self) -> StreamType {
        match self {
            DomainRecord::Transaction(_) => StreamType::Record,
            DomainRecord::Event(_) => StreamType::Event,
            DomainRecord::Balance(_) => StreamType::Balance,
        }
    }
}

/// Identifies a transaction by payer and valid-start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Paying account.
    pub payer: EntityNum,
    /// Start of the transaction's validity window.
    pub valid_start: ConsensusTimestamp,
}

/// A transaction as reached consensus, with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// When consensus was reached.
    pub consensus_timestamp: ConsensusTimestamp,
    /// Payer and valid start.
    pub transaction_id: TransactionId,
    /// Response code; `RESULT_SUCCESS` on success.
    pub result: u32,
    /// Fee charged to the payer, in tinybars.
    pub charged_fee: u64,
    /// Free-form memo.
    pub memo: String,
    /// Decoded body.
    pub body: TransactionBody,
    /// Signed transaction bytes as submitted.
    pub transaction_bytes: Vec<u8>,
}

impl TransactionRecord {
    /// True if the transaction succeeded.
    pub fn is_successful(&self) -> bool {
        self.result == RESULT_SUCCESS
    }
}

/// The transaction kinds the importer understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionBody {
    /// Hbar transfers between accounts.
    CryptoTransfer {
        /// Balance adjustments; they sum to zero.
        transfers: Vec<Transfer>,
    },
    /// A message submitted to a consensus topic.
    ConsensusSubmitMessage {
        /// Target topic.
        topic_id: EntityNum,
        /// Sequence number assigned within the topic.
        sequence_number: u64,
        /// Message payload.
        message: Vec<u8>,
    },
    /// Replaces the contents of a file.
    FileUpdate {
        /// Target file.
        file_id: EntityNum,
        /// New contents.
        contents: Vec<u8>,
    },
    /// Appends to the contents of a file.
    FileAppend {
        /// Target file.
        file_id: EntityNum,
        /// Appended bytes.
        contents: Vec<u8>,
    },
    /// Any other transaction type, kept by its numeric code.
    Other {
        /// Transaction type code.
        type_code: u32,
    },
}

/// A single balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Adjusted account.
    pub account: EntityNum,
    /// Signed amount in tinybars.
    pub amount: i64,
}

/// A consensus event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Node that created the event.
    pub creator_node_id: NodeId,
    /// Creator-local sequence number.
    pub creator_sequence: u64,
    /// When the event reached consensus.
    pub consensus_timestamp: ConsensusTimestamp,
    /// Global consensus order.
    pub consensus_order: u64,
    /// Raw transactions carried by the event.
    pub transactions: Vec<Vec<u8>>,
}

/// Balance of one account at a snapshot instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Snapshot instant.
    pub consensus_timestamp: ConsensusTimestamp,
    /// Account.
    pub account: EntityNum,
    /// Balance in tinybars.
    pub balance: i64,
}
