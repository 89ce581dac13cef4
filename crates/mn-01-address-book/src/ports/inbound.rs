//! # Inbound Ports (Driving Ports / API)
//!
//! Read access to the current address book.

use crate::domain::{AddressBook, AddressBookEntry, AddressBookError};
use std::sync::Arc;

/// Primary Address Book API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait AddressBookApi: Send + Sync {
    /// The current snapshot.
    ///
    /// # Errors
    /// * `AddressBookError::Unavailable` - nothing has been loaded yet
    fn current(&self) -> Result<Arc<AddressBook>, AddressBookError>;

    /// Entries of the current snapshot in node id order.
    fn current_entries(&self) -> Result<Vec<AddressBookEntry>, AddressBookError> {
        Ok(self.current()?.entries().cloned().collect())
    }

    /// Total stake of the current snapshot; the quorum denominator.
    fn total_stake(&self) -> Result<u64, AddressBookError> {
        Ok(self.current()?.total_stake())
    }
}
