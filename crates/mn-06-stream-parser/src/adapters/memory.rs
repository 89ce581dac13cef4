//! In-memory `Persister` with failure injection.

use crate::domain::aggregates::FileAggregates;
use crate::domain::errors::PersistError;
use crate::ports::outbound::Persister;
use async_trait::async_trait;
use mn_04_stream_reader::StreamFileMetadata;
use parking_lot::Mutex;
use shared_types::{DomainRecord, StreamFilename};
use std::time::Duration;

/// A file as committed to the in-memory store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedFile {
    /// File metadata.
    pub metadata: StreamFileMetadata,
    /// Records in persist order.
    pub records: Vec<DomainRecord>,
    /// Aggregates passed to `persist_file`.
    pub aggregates: FileAggregates,
}

struct OpenFile {
    metadata: StreamFileMetadata,
    records: Vec<DomainRecord>,
    aggregates: Option<FileAggregates>,
}

#[derive(Default)]
struct State {
    open: Option<OpenFile>,
    committed: Vec<CommittedFile>,
    rollbacks: u64,
    failing_records: u32,
    failing_commits: u32,
    record_delay: Option<Duration>,
}

/// Persister keeping committed files in memory.
#[derive(Default)]
pub struct InMemoryPersister {
    state: Mutex<State>,
}

impl InMemoryPersister {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls to `persist_record`.
    pub fn fail_next_records(&self, count: u32) {
        self.state.lock().failing_records = count;
    }

    /// Fail the next `count` calls to `commit`.
    pub fn fail_next_commits(&self, count: u32) {
        self.state.lock().failing_commits = count;
    }

    /// Sleep this long inside every `persist_record`.
    pub fn set_record_delay(&self, delay: Option<Duration>) {
        self.state.lock().record_delay = delay;
    }

    /// Committed files in commit order.
    pub fn committed(&self) -> Vec<CommittedFile> {
        self.state.lock().committed.clone()
    }

    /// Names of committed files in commit order.
    pub fn committed_names(&self) -> Vec<StreamFilename> {
        self.state
            .lock()
            .committed
            .iter()
            .map(|f| f.metadata.name)
            .collect()
    }

    /// Total committed records.
    pub fn record_count(&self) -> usize {
        self.state
            .lock()
            .committed
            .iter()
            .map(|f| f.records.len())
            .sum()
    }

    /// Rollbacks performed.
    pub fn rollbacks(&self) -> u64 {
        self.state.lock().rollbacks
    }

    /// True while a file transaction is open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open.is_some()
    }
}

#[async_trait]
impl Persister for InMemoryPersister {
    async fn begin_file(&self, metadata: &StreamFileMetadata) -> Result<(), PersistError> {
        let mut state = self.state.lock();
        if let Some(open) = &state.open {
            return Err(PersistError::FileAlreadyOpen(open.metadata.name));
        }
        state.open = Some(OpenFile {
            metadata: metadata.clone(),
            records: Vec::new(),
            aggregates: None,
        });
        Ok(())
    }

    async fn persist_record(&self, record: &DomainRecord) -> Result<(), PersistError> {
        let delay = self.state.lock().record_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_records > 0 {
            state.failing_records -= 1;
            return Err(PersistError::Backend("injected record failure".into()));
        }
        let open = state.open.as_mut().ok_or(PersistError::NoOpenFile)?;
        open.records.push(record.clone());
        Ok(())
    }

    async fn persist_file(
        &self,
        _metadata: &StreamFileMetadata,
        aggregates: &FileAggregates,
    ) -> Result<(), PersistError> {
        let mut state = self.state.lock();
        let open = state.open.as_mut().ok_or(PersistError::NoOpenFile)?;
        open.aggregates = Some(aggregates.clone());
        Ok(())
    }

    async fn commit(&self) -> Result<(), PersistError> {
        let mut state = self.state.lock();
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(PersistError::Backend("injected commit failure".into()));
        }
        let open = state.open.take().ok_or(PersistError::NoOpenFile)?;
        state.committed.push(CommittedFile {
            metadata: open.metadata,
            records: open.records,
            aggregates: open.aggregates.unwrap_or_default(),
        });
        Ok(())
    }

    async fn rollback(&self) -> Result<(), PersistError> {
        let mut state = self.state.lock();
        if state.open.take().is_some() {
            state.rollbacks += 1;
        }
        Ok(())
    }
}
