//! # Address Book Refresh
//!
//! Persister decorator that watches committed record files for writes to
//! the address book system file and swaps in the new book once the file
//! carrying them is durable.
//!
//! ## Restarts
//!
//! An update may be completed by appends several files later. With a
//! state file configured, every commit that touched the address book
//! writes the current book, any partial staged contents, and the name of
//! the record file they reflect. Startup restores all three. A file at or
//! before that name is a replay and its writes are not staged again.

use async_trait::async_trait;
use mn_01_address_book::{AddressBook, AddressBookApi, AddressBookService};
use mn_04_stream_reader::StreamFileMetadata;
use mn_06_stream_parser::{FileAggregates, PersistError, Persister};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{DomainRecord, StreamFilename, TransactionBody};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

// =============================================================================
// State file
// =============================================================================

/// Failures reading or writing the refresh state.
#[derive(Debug, Error)]
pub enum RefreshStateError {
    /// Filesystem error.
    #[error("Address book state {path}: {source}")]
    Io {
        /// State file path.
        path: PathBuf,
        /// Cause.
        source: io::Error,
    },

    /// Contents did not decode.
    #[error("Address book state {path} is corrupt: {reason}")]
    Corrupt {
        /// State file path.
        path: PathBuf,
        /// What failed.
        reason: String,
    },
}

/// On-disk form; byte buffers are hex.
#[derive(Serialize, Deserialize)]
struct RefreshState {
    as_of: StreamFilename,
    book: Option<String>,
    staged: Option<String>,
}

/// Address book refresh state kept as one JSON file.
#[derive(Clone, Debug)]
pub struct RefreshStateFile {
    path: PathBuf,
}

impl RefreshStateFile {
    /// State stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl ToString) -> RefreshStateError {
        RefreshStateError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Restore a previous run's refresh into `service`.
    ///
    /// Returns the record file the state reflects, or `None` if no state
    /// was written yet.
    pub fn restore(
        &self,
        service: &AddressBookService,
    ) -> Result<Option<StreamFilename>, RefreshStateError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RefreshStateError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let state: RefreshState = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e))?;

        if let Some(book) = &state.book {
            let json = hex::decode(book).map_err(|e| self.corrupt(e))?;
            let book = AddressBook::from_json(&json).map_err(|e| self.corrupt(e))?;
            service.replace(book);
        }
        service.discard_staged();
        if let Some(staged) = &state.staged {
            service.stage_update(&hex::decode(staged).map_err(|e| self.corrupt(e))?);
        }
        info!(
            as_of = %state.as_of,
            staged = state.staged.is_some(),
            "[runtime] Address book state restored"
        );
        Ok(Some(state.as_of))
    }

    /// Write `service`'s book and staged contents as of `as_of`.
    pub async fn save(
        &self,
        as_of: StreamFilename,
        service: &AddressBookService,
    ) -> Result<(), RefreshStateError> {
        let state = RefreshState {
            as_of,
            book: service.current().ok().map(|book| hex::encode(book.to_json())),
            staged: service.staged().map(hex::encode),
        };
        let bytes = serde_json::to_vec_pretty(&state).map_err(|e| self.corrupt(e))?;
        self.write_atomic(&bytes)
            .await
            .map_err(|source| RefreshStateError::Io {
                path: self.path.clone(),
                source,
            })
    }

    async fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await
    }
}

// =============================================================================
// Persister
// =============================================================================

enum FileWrite {
    Update(Vec<u8>),
    Append(Vec<u8>),
}

#[derive(Default)]
struct Progress {
    /// File being persisted.
    open: Option<StreamFilename>,
    /// Last file whose writes reached the service.
    as_of: Option<StreamFilename>,
    pending: Vec<FileWrite>,
}

/// Wraps a persister and forwards address book file writes to the service.
///
/// Writes seen in a file are held until that file commits and dropped on
/// rollback. Contents that do not yet decode stay staged in the service, so
/// an update followed by appends may span several stream files.
pub struct AddressBookPersister<P> {
    inner: P,
    address_book: Arc<AddressBookService>,
    state_file: Option<RefreshStateFile>,
    progress: Mutex<Progress>,
}

impl<P: Persister> AddressBookPersister<P> {
    /// Wrap `inner`.
    pub fn new(inner: P, address_book: Arc<AddressBookService>) -> Self {
        Self {
            inner,
            address_book,
            state_file: None,
            progress: Mutex::new(Progress::default()),
        }
    }

    /// Record each refresh in `state_file`, resuming after `as_of`.
    pub fn with_state_file(
        mut self,
        state_file: RefreshStateFile,
        as_of: Option<StreamFilename>,
    ) -> Self {
        self.state_file = Some(state_file);
        self.progress.get_mut().as_of = as_of;
        self
    }

    /// The wrapped persister.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn observe(&self, record: &DomainRecord) {
        let DomainRecord::Transaction(tx) = record else {
            return;
        };
        if !tx.is_successful() {
            return;
        }
        let write = match &tx.body {
            TransactionBody::FileUpdate { file_id, contents }
                if self.address_book.is_address_book_file(*file_id) =>
            {
                FileWrite::Update(contents.clone())
            }
            TransactionBody::FileAppend { file_id, contents }
                if self.address_book.is_address_book_file(*file_id) =>
            {
                FileWrite::Append(contents.clone())
            }
            _ => return,
        };
        self.progress.lock().pending.push(write);
    }

    async fn apply_pending(&self) {
        let (name, writes) = {
            let mut progress = self.progress.lock();
            let writes = std::mem::take(&mut progress.pending);
            let Some(name) = progress.open.take() else {
                return;
            };
            if writes.is_empty() {
                return;
            }
            if progress.as_of.is_some_and(|as_of| name <= as_of) {
                debug!(file = %name, "[runtime] Address book writes already applied, skipped");
                return;
            }
            progress.as_of = Some(name);
            (name, writes)
        };

        for write in &writes {
            match write {
                FileWrite::Update(contents) => self.address_book.stage_update(contents),
                FileWrite::Append(contents) => self.address_book.stage_append(contents),
            }
        }
        match self.address_book.apply_staged() {
            Ok(Some(book)) => info!(
                nodes = book.len(),
                total_stake = book.total_stake(),
                "[runtime] Address book refreshed from file update"
            ),
            Ok(None) => {}
            Err(e) => warn!(
                error = %e,
                "[runtime] Staged address book incomplete, keeping previous book"
            ),
        }

        if let Some(state_file) = &self.state_file {
            if let Err(e) = state_file.save(name, &self.address_book).await {
                error!(error = %e, "[runtime] Failed to save address book state");
            }
        }
    }
}

#[async_trait]
impl<P: Persister> Persister for AddressBookPersister<P> {
    async fn begin_file(&self, metadata: &StreamFileMetadata) -> Result<(), PersistError> {
        {
            let mut progress = self.progress.lock();
            progress.pending.clear();
            progress.open = Some(metadata.name);
        }
        self.inner.begin_file(metadata).await
    }

    async fn persist_record(&self, record: &DomainRecord) -> Result<(), PersistError> {
        self.inner.persist_record(record).await?;
        self.observe(record);
        Ok(())
    }

    async fn persist_file(
        &self,
        metadata: &StreamFileMetadata,
        aggregates: &FileAggregates,
    ) -> Result<(), PersistError> {
        self.inner.persist_file(metadata, aggregates).await
    }

    async fn commit(&self) -> Result<(), PersistError> {
        self.inner.commit().await?;
        self.apply_pending().await;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), PersistError> {
        {
            let mut progress = self.progress.lock();
            progress.pending.clear();
            progress.open = None;
        }
        self.inner.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mn_01_address_book::{
        AddressBook, AddressBookApi, AddressBookConfig, AddressBookEntry, ADDRESS_BOOK_FILE_ID,
    };
    use mn_06_stream_parser::InMemoryPersister;
    use shared_types::{
        ConsensusTimestamp, Digest, FileKind, StreamFilename, StreamType, TransactionId,
        TransactionRecord, RESULT_SUCCESS,
    };

    fn book(nodes: u64) -> AddressBook {
        AddressBook::new(
            (0..nodes)
                .map(|i| AddressBookEntry::new(i, vec![0xAB, i as u8], 10))
                .collect(),
        )
        .unwrap()
    }

    fn metadata(i: i64) -> StreamFileMetadata {
        let timestamp = ConsensusTimestamp::from_parts(1_567_188_900 + 2 * i, 0);
        StreamFileMetadata {
            name: StreamFilename::new(StreamType::Record, FileKind::Data, timestamp),
            stream_type: StreamType::Record,
            version: 2,
            hapi_version: Some(1),
            consensus_start: timestamp,
            consensus_end: timestamp,
            previous_hash: Digest::ZERO,
            hash: Digest::new([9; 48]),
            count: 1,
            size: 64,
        }
    }

    fn file_write(body: TransactionBody, result: u32) -> DomainRecord {
        let timestamp = ConsensusTimestamp::from_parts(1_567_188_900, 0);
        DomainRecord::Transaction(TransactionRecord {
            consensus_timestamp: timestamp,
            transaction_id: TransactionId {
                payer: 2,
                valid_start: timestamp,
            },
            result,
            charged_fee: 5,
            memo: String::new(),
            body,
            transaction_bytes: vec![],
        })
    }

    fn update(contents: &[u8]) -> DomainRecord {
        file_write(
            TransactionBody::FileUpdate {
                file_id: ADDRESS_BOOK_FILE_ID,
                contents: contents.to_vec(),
            },
            RESULT_SUCCESS,
        )
    }

    fn append(contents: &[u8]) -> DomainRecord {
        file_write(
            TransactionBody::FileAppend {
                file_id: ADDRESS_BOOK_FILE_ID,
                contents: contents.to_vec(),
            },
            RESULT_SUCCESS,
        )
    }

    fn setup() -> (Arc<AddressBookService>, AddressBookPersister<InMemoryPersister>) {
        let service = Arc::new(AddressBookService::with_book(
            AddressBookConfig::default(),
            book(1),
        ));
        let persister = AddressBookPersister::new(InMemoryPersister::new(), Arc::clone(&service));
        (service, persister)
    }

    async fn persist(
        persister: &AddressBookPersister<InMemoryPersister>,
        i: i64,
        records: &[DomainRecord],
    ) {
        let metadata = metadata(i);
        persister.begin_file(&metadata).await.unwrap();
        for record in records {
            persister.persist_record(record).await.unwrap();
        }
        persister
            .persist_file(&metadata, &FileAggregates::new())
            .await
            .unwrap();
        persister.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_applied_after_commit() {
        let (service, persister) = setup();
        persist(&persister, 0, &[update(&book(3).to_json())]).await;

        assert_eq!(service.current().unwrap().len(), 3);
        assert!(!service.has_staged());
        assert_eq!(persister.inner().committed_names().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_append_across_files() {
        let (service, persister) = setup();
        let json = book(4).to_json();
        let (head, tail) = json.split_at(json.len() / 2);

        persist(&persister, 0, &[update(head)]).await;
        assert_eq!(service.current().unwrap().len(), 1);
        assert!(service.has_staged());

        persist(&persister, 1, &[append(tail)]).await;
        assert_eq!(service.current().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_rollback_drops_pending_writes() {
        let (service, persister) = setup();
        persister.begin_file(&metadata(0)).await.unwrap();
        persister
            .persist_record(&update(&book(3).to_json()))
            .await
            .unwrap();
        persister.rollback().await.unwrap();

        assert!(!service.has_staged());
        assert_eq!(service.current().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ignores_failed_and_unrelated_writes() {
        let (service, persister) = setup();
        let json = book(3).to_json();
        let failed = file_write(
            TransactionBody::FileUpdate {
                file_id: ADDRESS_BOOK_FILE_ID,
                contents: json.clone(),
            },
            RESULT_SUCCESS + 1,
        );
        let other_file = file_write(
            TransactionBody::FileUpdate {
                file_id: ADDRESS_BOOK_FILE_ID + 1,
                contents: json,
            },
            RESULT_SUCCESS,
        );
        persist(&persister, 0, &[failed, other_file]).await;

        assert!(!service.has_staged());
        assert_eq!(service.current().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_book() {
        let (service, persister) = setup();
        persister.inner().fail_next_commits(1);
        persister.begin_file(&metadata(0)).await.unwrap();
        persister
            .persist_record(&update(&book(3).to_json()))
            .await
            .unwrap();
        assert!(persister.commit().await.is_err());
        persister.rollback().await.unwrap();

        assert_eq!(service.current().unwrap().len(), 1);
        assert!(!service.has_staged());
    }

    #[tokio::test]
    async fn test_partial_update_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = RefreshStateFile::new(dir.path().join("address_book.json"));
        let json = book(4).to_json();
        let (head, tail) = json.split_at(json.len() / 2);

        let (_, persister) = setup();
        let persister = persister.with_state_file(state_file.clone(), None);
        persist(&persister, 0, &[update(head)]).await;
        drop(persister);

        let service = Arc::new(AddressBookService::with_book(
            AddressBookConfig::default(),
            book(1),
        ));
        let as_of = state_file.restore(&service).unwrap();
        assert_eq!(as_of, Some(metadata(0).name));
        assert_eq!(service.staged().unwrap(), head);

        let persister = AddressBookPersister::new(InMemoryPersister::new(), Arc::clone(&service))
            .with_state_file(state_file.clone(), as_of);
        persist(&persister, 1, &[append(tail)]).await;
        assert_eq!(service.current().unwrap().len(), 4);

        let restarted = AddressBookService::new(AddressBookConfig::default());
        assert_eq!(state_file.restore(&restarted).unwrap(), Some(metadata(1).name));
        assert_eq!(restarted.current().unwrap().len(), 4);
        assert!(!restarted.has_staged());
    }

    #[tokio::test]
    async fn test_replayed_file_not_staged_twice() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = RefreshStateFile::new(dir.path().join("address_book.json"));
        let json = book(3).to_json();
        let (head, tail) = json.split_at(json.len() / 2);

        let (service, persister) = setup();
        let persister = persister.with_state_file(state_file, None);
        persist(&persister, 0, &[update(head)]).await;
        persist(&persister, 1, &[append(tail)]).await;
        assert_eq!(service.current().unwrap().len(), 3);

        persist(&persister, 1, &[append(tail)]).await;
        assert!(!service.has_staged());
        assert_eq!(service.current().unwrap().len(), 3);
    }

    #[test]
    fn test_restore_without_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = RefreshStateFile::new(dir.path().join("missing.json"));
        let service = AddressBookService::with_book(AddressBookConfig::default(), book(2));
        assert_eq!(state_file.restore(&service).unwrap(), None);
        assert_eq!(service.current().unwrap().len(), 2);
    }

    #[test]
    fn test_restore_rejects_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("address_book.json");
        std::fs::write(&path, b"{not json").unwrap();
        let service = AddressBookService::with_book(AddressBookConfig::default(), book(2));
        assert!(matches!(
            RefreshStateFile::new(path).restore(&service),
            Err(RefreshStateError::Corrupt { .. })
        ));
        assert_eq!(service.current().unwrap().len(), 2);
    }
}
