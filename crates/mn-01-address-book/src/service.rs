//! # Address Book Service
//!
//! Holds the current snapshot and swaps it wholesale on refresh.
//!
//! ## Staged updates
//!
//! The address book lives in a system file that is rewritten by
//! file-update transactions, optionally followed by file-append
//! transactions. The service accumulates those contents in a staging buffer
//! while a stream file is being parsed. Once the stream file has committed
//! the caller invokes `apply_staged`: if the buffer decodes to a valid
//! address book it replaces the current snapshot. A buffer that does not
//! decode is kept, since later appends may complete it.

use crate::config::AddressBookConfig;
use crate::domain::{AddressBook, AddressBookError};
use crate::ports::AddressBookApi;
use parking_lot::{Mutex, RwLock};
use shared_types::EntityNum;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Address Book Service.
pub struct AddressBookService {
    config: AddressBookConfig,
    current: RwLock<Option<Arc<AddressBook>>>,
    staged: Mutex<Option<Vec<u8>>>,
}

impl AddressBookService {
    /// Create a service with no snapshot loaded.
    pub fn new(config: AddressBookConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            staged: Mutex::new(None),
        }
    }

    /// Create a service seeded with a snapshot.
    pub fn with_book(config: AddressBookConfig, book: AddressBook) -> Self {
        let service = Self::new(config);
        service.replace(book);
        service
    }

    /// Decode raw address book bytes and make them current.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn load(&self, bytes: &[u8]) -> Result<Arc<AddressBook>, AddressBookError> {
        let book = AddressBook::from_json(bytes)?;
        Ok(self.replace(book))
    }

    /// Replace the current snapshot.
    pub fn replace(&self, book: AddressBook) -> Arc<AddressBook> {
        let book = Arc::new(book);
        info!(
            nodes = book.len(),
            total_stake = book.total_stake(),
            "[mn-01] Address book loaded"
        );
        *self.current.write() = Some(Arc::clone(&book));
        book
    }

    /// True if `file_id` names the address book system file.
    pub fn is_address_book_file(&self, file_id: EntityNum) -> bool {
        file_id == self.config.file_id
    }

    /// Stage new file contents, discarding anything staged before.
    pub fn stage_update(&self, contents: &[u8]) {
        if contents.len() > self.config.max_staged_bytes {
            warn!(
                len = contents.len(),
                "[mn-01] Address book update exceeds staging limit, discarded"
            );
            *self.staged.lock() = None;
            return;
        }
        debug!(len = contents.len(), "[mn-01] Address book update staged");
        *self.staged.lock() = Some(contents.to_vec());
    }

    /// Append to the staged contents.
    pub fn stage_append(&self, contents: &[u8]) {
        let mut staged = self.staged.lock();
        let buffer = staged.get_or_insert_with(Vec::new);
        if buffer.len() + contents.len() > self.config.max_staged_bytes {
            warn!(
                len = buffer.len() + contents.len(),
                "[mn-01] Address book append exceeds staging limit, discarded"
            );
            *staged = None;
            return;
        }
        buffer.extend_from_slice(contents);
        debug!(len = buffer.len(), "[mn-01] Address book append staged");
    }

    /// True if contents are staged.
    pub fn has_staged(&self) -> bool {
        self.staged.lock().is_some()
    }

    /// Copy of the staged contents.
    pub fn staged(&self) -> Option<Vec<u8>> {
        self.staged.lock().clone()
    }

    /// Drop staged contents without applying them.
    pub fn discard_staged(&self) {
        *self.staged.lock() = None;
    }

    /// Try to turn the staged contents into the current snapshot.
    ///
    /// Returns `Ok(None)` when nothing is staged. On a decode error the
    /// buffer is kept and the current snapshot is untouched.
    pub fn apply_staged(&self) -> Result<Option<Arc<AddressBook>>, AddressBookError> {
        let mut staged = self.staged.lock();
        let Some(bytes) = staged.as_ref() else {
            return Ok(None);
        };
        let book = AddressBook::from_json(bytes)?;
        *staged = None;
        drop(staged);
        Ok(Some(self.replace(book)))
    }
}

impl AddressBookApi for AddressBookService {
    fn current(&self) -> Result<Arc<AddressBook>, AddressBookError> {
        self.current
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(AddressBookError::Unavailable)
    }
}
