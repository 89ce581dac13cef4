//! # Outbound Ports

use crate::domain::aggregates::FileAggregates;
use crate::domain::errors::PersistError;
use async_trait::async_trait;
use mn_04_stream_reader::StreamFileMetadata;
use shared_types::DomainRecord;

/// Transactional sink for parsed files - outbound port.
///
/// Calls for one file arrive in order: `begin_file`, `persist_record` per
/// item, `persist_file`, `commit`. `rollback` may arrive at any point after
/// `begin_file` and must discard everything since it.
#[async_trait]
pub trait Persister: Send + Sync {
    /// Open the transaction for a file.
    async fn begin_file(&self, metadata: &StreamFileMetadata) -> Result<(), PersistError>;

    /// Persist one record.
    async fn persist_record(&self, record: &DomainRecord) -> Result<(), PersistError>;

    /// Persist file-level metadata and the aggregates folded over its records.
    async fn persist_file(
        &self,
        metadata: &StreamFileMetadata,
        aggregates: &FileAggregates,
    ) -> Result<(), PersistError>;

    /// Make the file durable.
    async fn commit(&self) -> Result<(), PersistError>;

    /// Discard the open file, if any.
    async fn rollback(&self) -> Result<(), PersistError>;
}
