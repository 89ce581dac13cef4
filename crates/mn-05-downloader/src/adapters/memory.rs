//! In-memory storage, checkpoint store and listener.

use crate::domain::entities::{AcceptedFile, CycleReport, HaltReason};
use crate::domain::errors::{CheckpointError, StorageError};
use crate::ports::outbound::{CheckpointStore, StorageClient, StreamListener};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{LastValidCheckpoint, NodeId, StreamFilename, StreamType};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::time::Duration;

// =============================================================================
// Storage
// =============================================================================

#[derive(Default)]
struct Faults {
    transient: HashMap<String, u32>,
    latency: Option<Duration>,
    fetches: HashMap<String, u32>,
    lists: u32,
}

/// Object store held in a sorted map.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<Faults>,
}

impl InMemoryStorage {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object.
    pub fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.write().insert(key.into(), bytes);
    }

    /// Store a file under the node's directory for its stream.
    pub fn publish(&self, node_id: NodeId, name: &StreamFilename, bytes: Vec<u8>) {
        let key = name.stream_type().object_key(node_id, name);
        self.put(key, bytes);
    }

    /// Delete an object.
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.write().remove(key)
    }

    /// Fail the next `times` fetches of `key` with a transient error.
    pub fn fail_transiently(&self, key: impl Into<String>, times: u32) {
        self.faults.lock().transient.insert(key.into(), times);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().latency = latency;
    }

    /// Fetch calls made for `key`, failed ones included.
    pub fn fetch_count(&self, key: &str) -> u32 {
        self.faults.lock().fetches.get(key).copied().unwrap_or(0)
    }

    /// List calls made.
    pub fn list_count(&self) -> u32 {
        self.faults.lock().lists
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    async fn delay(&self) {
        let latency = self.faults.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StorageClient for InMemoryStorage {
    async fn list(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, StorageError> {
        self.delay().await;
        self.faults.lock().lists += 1;

        let objects = self.objects.read();
        Ok(objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .filter(|key| after.map_or(true, |after| key.as_str() > after))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.delay().await;
        {
            let mut faults = self.faults.lock();
            *faults.fetches.entry(key.to_string()).or_default() += 1;
            if let Some(remaining) = faults.transient.get_mut(key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StorageError::Unavailable(format!("injected fault on {}", key)));
                }
            }
        }
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

// =============================================================================
// Checkpoints
// =============================================================================

/// Checkpoint store held in memory.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: Mutex<HashMap<StreamType, LastValidCheckpoint>>,
    saves: Mutex<u32>,
    failing_saves: Mutex<u32>,
}

impl InMemoryCheckpointStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one checkpoint.
    pub fn with_checkpoint(checkpoint: LastValidCheckpoint) -> Self {
        let store = Self::default();
        store
            .checkpoints
            .lock()
            .insert(checkpoint.stream_type(), checkpoint);
        store
    }

    /// Current checkpoint of `stream`.
    pub fn get(&self, stream: StreamType) -> Option<LastValidCheckpoint> {
        self.checkpoints.lock().get(&stream).copied()
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> u32 {
        *self.saves.lock()
    }

    /// Fail the next `count` saves with a permanent error.
    pub fn fail_next_saves(&self, count: u32) {
        *self.failing_saves.lock() = count;
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(
        &self,
        stream: StreamType,
    ) -> Result<Option<LastValidCheckpoint>, CheckpointError> {
        Ok(self.get(stream))
    }

    async fn save(&self, checkpoint: &LastValidCheckpoint) -> Result<(), CheckpointError> {
        {
            let mut failing = self.failing_saves.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(CheckpointError::Corrupt("injected save failure".into()));
            }
        }
        self.checkpoints
            .lock()
            .insert(checkpoint.stream_type(), *checkpoint);
        *self.saves.lock() += 1;
        Ok(())
    }
}

// =============================================================================
// Listener
// =============================================================================

/// Listener that records every callback.
#[derive(Default)]
pub struct RecordingListener {
    accepted: Mutex<Vec<AcceptedFile>>,
    halts: Mutex<Vec<HaltReason>>,
    cycles: Mutex<u32>,
}

impl RecordingListener {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted files in callback order.
    pub fn accepted(&self) -> Vec<AcceptedFile> {
        self.accepted.lock().clone()
    }

    /// Halt reasons in callback order.
    pub fn halts(&self) -> Vec<HaltReason> {
        self.halts.lock().clone()
    }

    /// Completed cycles.
    pub fn cycles(&self) -> u32 {
        *self.cycles.lock()
    }
}

impl StreamListener for RecordingListener {
    fn on_file_accepted(&self, _stream: StreamType, file: &AcceptedFile) {
        self.accepted.lock().push(file.clone());
    }

    fn on_halt(&self, _stream: StreamType, reason: &HaltReason) {
        self.halts.lock().push(reason.clone());
    }

    fn on_cycle_complete(&self, _report: &CycleReport) {
        *self.cycles.lock() += 1;
    }
}
