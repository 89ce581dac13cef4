//! # Stream File Parser Service
//!
//! Drives one verified file through the `Persister` transaction, retrying
//! from scratch after a rollback.

use crate::config::ParserConfig;
use crate::domain::aggregates::FileAggregates;
use crate::domain::entities::ParseSummary;
use crate::domain::errors::{ParserError, PersistError};
use crate::ports::inbound::StreamParserApi;
use crate::ports::outbound::Persister;
use async_trait::async_trait;
use mn_04_stream_reader::{ReaderError, StreamFile, StreamFileMetadata};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Why one attempt failed.
enum AttemptError {
    Read(ReaderError),
    Persist(PersistError),
    Timeout,
}

/// Stream file parser.
pub struct StreamFileParser<P: Persister> {
    config: ParserConfig,
    persister: Arc<P>,
}

impl<P: Persister> StreamFileParser<P> {
    /// Create a parser writing to `persister`.
    pub fn new(config: ParserConfig, persister: Arc<P>) -> Self {
        Self { config, persister }
    }

    /// The persister.
    pub fn persister(&self) -> &Arc<P> {
        &self.persister
    }

    async fn attempt(
        &self,
        file: &StreamFile,
        metadata: &StreamFileMetadata,
    ) -> Result<(u64, FileAggregates), AttemptError> {
        self.persister
            .begin_file(metadata)
            .await
            .map_err(AttemptError::Persist)?;

        let mut aggregates = FileAggregates::new();
        let mut persisted: u64 = 0;
        for item in file.items().map_err(AttemptError::Read)? {
            let record = item.map_err(AttemptError::Read)?;
            self.persister
                .persist_record(&record)
                .await
                .map_err(AttemptError::Persist)?;
            aggregates.observe(&record);
            persisted += 1;
        }

        self.persister
            .persist_file(metadata, &aggregates)
            .await
            .map_err(AttemptError::Persist)?;
        self.persister
            .commit()
            .await
            .map_err(AttemptError::Persist)?;
        Ok((persisted, aggregates))
    }

    async fn rollback(&self, file: &StreamFile) {
        if let Err(e) = self.persister.rollback().await {
            warn!(file = %file.name, error = %e, "[mn-06] Rollback failed");
        }
    }
}

#[async_trait]
impl<P: Persister> StreamParserApi for StreamFileParser<P> {
    async fn parse(&self, file: &StreamFile) -> Result<ParseSummary, ParserError> {
        let metadata = file.metadata();
        let attempts = self.config.attempts();
        let bound = self.config.persist_timeout();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(file = %file.name, attempt, "[mn-06] Persisting file");

            let outcome = match timeout(bound, self.attempt(file, &metadata)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AttemptError::Timeout),
            };

            let error = match outcome {
                Ok((records, aggregates)) => {
                    info!(
                        file = %file.name,
                        records,
                        topics = aggregates.lookup_count(),
                        attempt,
                        "[mn-06] File persisted"
                    );
                    return Ok(ParseSummary {
                        name: file.name,
                        hash: file.hash,
                        records,
                        attempts: attempt,
                        aggregates,
                    });
                }
                Err(error) => error,
            };

            self.rollback(file).await;

            match error {
                // Decoding is deterministic; another attempt cannot succeed.
                AttemptError::Read(source) => {
                    return Err(ParserError::Read {
                        name: file.name,
                        source,
                    })
                }
                AttemptError::Persist(source) if attempt >= attempts => {
                    return Err(ParserError::Persist {
                        name: file.name,
                        attempts: attempt,
                        source,
                    })
                }
                AttemptError::Timeout if attempt >= attempts => {
                    return Err(ParserError::Timeout {
                        name: file.name,
                        attempts: attempt,
                        timeout: bound,
                    })
                }
                AttemptError::Persist(e) => {
                    warn!(file = %file.name, attempt, error = %e, "[mn-06] Attempt failed, retrying");
                }
                AttemptError::Timeout => {
                    warn!(file = %file.name, attempt, ?bound, "[mn-06] Attempt timed out, retrying");
                }
            }
        }
    }
}
