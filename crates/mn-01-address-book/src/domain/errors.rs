//! # Domain Errors
//!
//! Error types for the address book.

use shared_types::NodeId;
use thiserror::Error;

/// Address book error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressBookError {
    /// No valid address book has been loaded yet.
    #[error("Address book unavailable: no valid address book has been loaded")]
    Unavailable,

    /// The address book file could not be decoded.
    #[error("Malformed address book: {0}")]
    Malformed(String),

    /// The address book lists no nodes.
    #[error("Address book has no entries")]
    Empty,

    /// A node id appears more than once.
    #[error("Duplicate node id in address book: {0}")]
    DuplicateNode(NodeId),

    /// A node has no public key.
    #[error("Node {0} has an empty public key")]
    EmptyPublicKey(NodeId),

    /// Summed stake does not fit in 64 bits.
    #[error("Total stake overflows u64")]
    StakeOverflow,
}
