//! # JSON Lines Persister
//!
//! Writes each committed stream file as `{out}/{stream path}/{file}.jsonl`:
//! a `file` header line, one line per record, then a `summary` line with
//! the file aggregates. Nothing reaches disk before `commit`, and the file
//! appears atomically, so a rolled-back or crashed attempt leaves no trace
//! and re-persisting a file overwrites the earlier copy.

use async_trait::async_trait;
use mn_04_stream_reader::StreamFileMetadata;
use mn_06_stream_parser::{FileAggregates, PersistError, Persister, TopicMessageLookup};
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{DomainRecord, StreamFilename};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Serialize)]
struct HeaderLine<'a> {
    file: &'a StreamFileMetadata,
}

#[derive(Serialize)]
struct Summary<'a> {
    records: u64,
    failed_transactions: u64,
    charged_fees: u64,
    topic_lookups: Vec<&'a TopicMessageLookup>,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: Summary<'a>,
}

struct OpenFile {
    name: StreamFilename,
    buffer: Vec<u8>,
}

/// Persister writing one JSON lines file per stream file.
pub struct JsonLinesPersister {
    out_dir: PathBuf,
    open: Mutex<Option<OpenFile>>,
}

impl JsonLinesPersister {
    /// Write below `out_dir`; directories are created on commit.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            open: Mutex::new(None),
        }
    }

    /// Output path of a stream file.
    pub fn path_for(&self, name: &StreamFilename) -> PathBuf {
        self.out_dir
            .join(name.stream_type().path())
            .join(format!("{}.jsonl", name))
    }

    fn append_line<T: Serialize>(&self, value: &T) -> Result<(), PersistError> {
        let mut open = self.open.lock();
        let file = open.as_mut().ok_or(PersistError::NoOpenFile)?;
        serde_json::to_writer(&mut file.buffer, value)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;
        file.buffer.push(b'\n');
        Ok(())
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("jsonl.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
}

#[async_trait]
impl Persister for JsonLinesPersister {
    async fn begin_file(&self, metadata: &StreamFileMetadata) -> Result<(), PersistError> {
        {
            let mut open = self.open.lock();
            if let Some(file) = open.as_ref() {
                return Err(PersistError::FileAlreadyOpen(file.name));
            }
            *open = Some(OpenFile {
                name: metadata.name,
                buffer: Vec::with_capacity(metadata.size),
            });
        }
        self.append_line(&HeaderLine { file: metadata })
    }

    async fn persist_record(&self, record: &DomainRecord) -> Result<(), PersistError> {
        self.append_line(record)
    }

    async fn persist_file(
        &self,
        _metadata: &StreamFileMetadata,
        aggregates: &FileAggregates,
    ) -> Result<(), PersistError> {
        self.append_line(&SummaryLine {
            summary: Summary {
                records: aggregates.records,
                failed_transactions: aggregates.failed_transactions,
                charged_fees: aggregates.charged_fees,
                topic_lookups: aggregates.lookups().collect(),
            },
        })
    }

    async fn commit(&self) -> Result<(), PersistError> {
        let file = self.open.lock().take().ok_or(PersistError::NoOpenFile)?;
        let path = self.path_for(&file.name);
        Self::write_atomic(&path, &file.buffer).await?;
        debug!(file = %file.name, path = %path.display(), bytes = file.buffer.len(), "[runtime] Stream file written");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), PersistError> {
        self.open.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        AccountBalance, ConsensusTimestamp, Digest, FileKind, StreamType,
    };

    fn metadata() -> StreamFileMetadata {
        let timestamp = ConsensusTimestamp::from_parts(1_567_188_900, 0);
        StreamFileMetadata {
            name: StreamFilename::new(StreamType::Balance, FileKind::Data, timestamp),
            stream_type: StreamType::Balance,
            version: 2,
            hapi_version: Some(1),
            consensus_start: timestamp,
            consensus_end: timestamp,
            previous_hash: Digest::ZERO,
            hash: Digest::new([1; 48]),
            count: 2,
            size: 128,
        }
    }

    fn balance(account: u64) -> DomainRecord {
        DomainRecord::Balance(AccountBalance {
            consensus_timestamp: ConsensusTimestamp::from_parts(1_567_188_900, 0),
            account,
            balance: 100,
        })
    }

    #[tokio::test]
    async fn test_commit_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let persister = JsonLinesPersister::new(dir.path());
        let metadata = metadata();

        persister.begin_file(&metadata).await.unwrap();
        persister.persist_record(&balance(2)).await.unwrap();
        persister.persist_record(&balance(3)).await.unwrap();
        let mut aggregates = FileAggregates::new();
        aggregates.observe(&balance(2));
        aggregates.observe(&balance(3));
        persister.persist_file(&metadata, &aggregates).await.unwrap();
        persister.commit().await.unwrap();

        let path = persister.path_for(&metadata.name);
        assert!(path.starts_with(dir.path().join("accountBalances")));
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].get("file").is_some());
        let record: DomainRecord = serde_json::from_value(lines[1].clone()).unwrap();
        assert_eq!(record, balance(2));
        assert_eq!(lines[3]["summary"]["records"], 2);
    }

    #[tokio::test]
    async fn test_rollback_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let persister = JsonLinesPersister::new(dir.path());
        let metadata = metadata();

        persister.begin_file(&metadata).await.unwrap();
        persister.persist_record(&balance(2)).await.unwrap();
        persister.rollback().await.unwrap();

        assert!(!persister.path_for(&metadata.name).exists());
        assert!(matches!(
            persister.commit().await,
            Err(PersistError::NoOpenFile)
        ));
        persister.begin_file(&metadata).await.unwrap();
    }

    #[tokio::test]
    async fn test_one_open_file_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let persister = JsonLinesPersister::new(dir.path());

        persister.begin_file(&metadata()).await.unwrap();
        assert!(matches!(
            persister.begin_file(&metadata()).await,
            Err(PersistError::FileAlreadyOpen(_))
        ));
        assert!(matches!(
            JsonLinesPersister::new(dir.path()).persist_record(&balance(1)).await,
            Err(PersistError::NoOpenFile)
        ));
    }
}
