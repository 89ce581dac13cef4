//! # File Aggregates
//!
//! State folded over a file's records and handed to `persist_file` before
//! commit. The main aggregate is the topic message lookup: for each monthly
//! partition and topic, the sequence number range and timestamp range seen.
//! A downstream reader uses it to find which partition holds a given
//! sequence number without scanning.

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, DomainRecord, EntityNum, TransactionBody};
use std::collections::BTreeMap;

/// Sequence and timestamp range of one topic within one monthly partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessageLookup {
    /// Monthly partition label (`YYYY_MM`).
    pub partition: String,
    /// Topic.
    pub topic_id: EntityNum,
    /// Lowest sequence number seen.
    pub first_sequence: u64,
    /// Highest sequence number seen.
    pub last_sequence: u64,
    /// Earliest consensus timestamp seen.
    pub first_timestamp: ConsensusTimestamp,
    /// Latest consensus timestamp seen.
    pub last_timestamp: ConsensusTimestamp,
}

impl TopicMessageLookup {
    fn single(
        partition: String,
        topic_id: EntityNum,
        sequence: u64,
        timestamp: ConsensusTimestamp,
    ) -> Self {
        Self {
            partition,
            topic_id,
            first_sequence: sequence,
            last_sequence: sequence,
            first_timestamp: timestamp,
            last_timestamp: timestamp,
        }
    }

    /// Widen this range to cover `other`.
    pub fn merge(&mut self, other: &TopicMessageLookup) {
        self.first_sequence = self.first_sequence.min(other.first_sequence);
        self.last_sequence = self.last_sequence.max(other.last_sequence);
        self.first_timestamp = self.first_timestamp.min(other.first_timestamp);
        self.last_timestamp = self.last_timestamp.max(other.last_timestamp);
    }
}

/// Everything derived from one file's records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAggregates {
    /// Records observed.
    pub records: u64,
    /// Transactions whose result was not success.
    pub failed_transactions: u64,
    /// Sum of fees charged, saturating.
    pub charged_fees: u64,
    lookups: BTreeMap<(String, EntityNum), TopicMessageLookup>,
}

impl FileAggregates {
    /// Empty aggregates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in.
    pub fn observe(&mut self, record: &DomainRecord) {
        self.records += 1;

        let DomainRecord::Transaction(tx) = record else {
            return;
        };
        self.charged_fees = self.charged_fees.saturating_add(tx.charged_fee);
        if !tx.is_successful() {
            self.failed_transactions += 1;
            return;
        }

        if let TransactionBody::ConsensusSubmitMessage {
            topic_id,
            sequence_number,
            ..
        } = tx.body
        {
            let lookup = TopicMessageLookup::single(
                tx.consensus_timestamp.month_partition(),
                topic_id,
                sequence_number,
                tx.consensus_timestamp,
            );
            self.insert(lookup);
        }
    }

    /// Fold another file's aggregates in.
    pub fn merge(&mut self, other: &FileAggregates) {
        self.records += other.records;
        self.failed_transactions += other.failed_transactions;
        self.charged_fees = self.charged_fees.saturating_add(other.charged_fees);
        for lookup in other.lookups.values() {
            self.insert(lookup.clone());
        }
    }

    /// Lookups ordered by partition, then topic.
    pub fn lookups(&self) -> impl Iterator<Item = &TopicMessageLookup> {
        self.lookups.values()
    }

    /// Lookup for one partition and topic.
    pub fn lookup(&self, partition: &str, topic_id: EntityNum) -> Option<&TopicMessageLookup> {
        self.lookups.get(&(partition.to_string(), topic_id))
    }

    /// Number of (partition, topic) pairs.
    pub fn lookup_count(&self) -> usize {
        self.lookups.len()
    }

    fn insert(&mut self, lookup: TopicMessageLookup) {
        let key = (lookup.partition.clone(), lookup.topic_id);
        match self.lookups.get_mut(&key) {
            Some(existing) => existing.merge(&lookup),
            None => {
                self.lookups.insert(key, lookup);
            }
        }
    }
}
