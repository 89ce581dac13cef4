//! # Address Book Entities
//!
//! `AddressBook` is an immutable snapshot. Validation happens once, in
//! `AddressBook::new`; every snapshot that exists is well-formed.

use crate::domain::errors::AddressBookError;
use serde::{Deserialize, Serialize};
use shared_types::NodeId;
use std::collections::BTreeMap;

/// System file id that holds the address book.
pub const ADDRESS_BOOK_FILE_ID: u64 = 102;

/// One known node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Node identifier, as used in storage paths.
    pub node_id: NodeId,
    /// Public key bytes (Ed25519 raw or secp256k1 SEC1).
    #[serde(with = "crate::domain::codec::hex_bytes")]
    pub public_key: Vec<u8>,
    /// Voting stake.
    pub stake: u64,
}

impl AddressBookEntry {
    /// Create an entry.
    pub fn new(node_id: NodeId, public_key: Vec<u8>, stake: u64) -> Self {
        Self {
            node_id,
            public_key,
            stake,
        }
    }
}

/// Immutable set of known nodes keyed by node id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressBook {
    entries: BTreeMap<NodeId, AddressBookEntry>,
    total_stake: u64,
}

impl AddressBook {
    /// Build a snapshot, rejecting empty lists, duplicate node ids, empty
    /// keys and stake overflow.
    pub fn new(entries: Vec<AddressBookEntry>) -> Result<Self, AddressBookError> {
        if entries.is_empty() {
            return Err(AddressBookError::Empty);
        }

        let mut map = BTreeMap::new();
        let mut total_stake: u64 = 0;
        for entry in entries {
            if entry.public_key.is_empty() {
                return Err(AddressBookError::EmptyPublicKey(entry.node_id));
            }
            total_stake = total_stake
                .checked_add(entry.stake)
                .ok_or(AddressBookError::StakeOverflow)?;
            let node_id = entry.node_id;
            if map.insert(node_id, entry).is_some() {
                return Err(AddressBookError::DuplicateNode(node_id));
            }
        }

        Ok(Self {
            entries: map,
            total_stake,
        })
    }

    /// Look up a node.
    pub fn get(&self, node_id: NodeId) -> Option<&AddressBookEntry> {
        self.entries.get(&node_id)
    }

    /// Entries in ascending node id order.
    pub fn entries(&self) -> impl Iterator<Item = &AddressBookEntry> {
        self.entries.values()
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed snapshot.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all stakes.
    pub fn total_stake(&self) -> u64 {
        self.total_stake
    }

    /// True when no node carries stake; every node then weighs 1.
    pub fn is_unweighted(&self) -> bool {
        self.total_stake == 0
    }

    /// Quorum weight of a node, `None` if unknown.
    pub fn weight_of(&self, node_id: NodeId) -> Option<u64> {
        let entry = self.entries.get(&node_id)?;
        if self.is_unweighted() {
            Some(1)
        } else {
            Some(entry.stake)
        }
    }

    /// Denominator for quorum checks.
    pub fn total_weight(&self) -> u64 {
        if self.is_unweighted() {
            self.entries.len() as u64
        } else {
            self.total_stake
        }
    }
}
