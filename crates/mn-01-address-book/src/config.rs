//! # Address Book Configuration

use crate::domain::ADDRESS_BOOK_FILE_ID;
use serde::{Deserialize, Serialize};
use shared_types::EntityNum;

/// Address book configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressBookConfig {
    /// System file whose updates replace the address book.
    pub file_id: EntityNum,

    /// Upper bound on staged file contents, in bytes. Appends past this
    /// limit discard the staged buffer.
    pub max_staged_bytes: usize,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            file_id: ADDRESS_BOOK_FILE_ID,
            max_staged_bytes: 1024 * 1024,
        }
    }
}

impl AddressBookConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            file_id: ADDRESS_BOOK_FILE_ID,
            max_staged_bytes: 4096,
        }
    }
}
