//! # Downloader Service
//!
//! One download cycle for one stream:
//!
//! 1. List each address-book node's directory after the checkpoint.
//! 2. Group signature files by data file name, ascending.
//! 3. Fetch signature files ahead (bounded), then per candidate in order:
//!    pick the consensus hash, fetch the data file from a signer, check the
//!    chain link, persist, save the checkpoint.
//!
//! The first candidate that cannot be accepted halts the cycle.

use crate::config::DownloaderConfig;
use crate::domain::entities::{AcceptedFile, CycleOutcome, CycleReport, CycleStage, HaltReason};
use crate::domain::errors::{DownloaderError, StorageError};
use crate::domain::retry::RetryPolicy;
use crate::ports::inbound::DownloaderApi;
use crate::ports::outbound::{CheckpointStore, NoopListener, StorageClient, StreamListener};
use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::StreamExt;
use mn_01_address_book::{AddressBook, AddressBookApi};
use mn_02_signature_verification::{
    SignatureFile, SignatureVerifier, VerificationReport, VerificationStatus,
};
use mn_03_hash_chain::{ChainVerdict, HashChainVerifier};
use mn_04_stream_reader::{StreamFile, StreamFileReader};
use mn_06_stream_parser::StreamParserApi;
use shared_types::{
    ConsensusTimestamp, Digest, FileKind, LastValidCheckpoint, NodeId, StreamFilename, StreamType,
};
use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};

/// Result of processing one candidate.
enum Step {
    Accepted(AcceptedFile),
    Halt(HaltReason),
}

/// Stream file downloader for one stream.
pub struct Downloader<S: StorageClient, A: AddressBookApi> {
    config: DownloaderConfig,
    storage: Arc<S>,
    address_book: Arc<A>,
    parser: Arc<dyn StreamParserApi>,
    checkpoints: Arc<dyn CheckpointStore>,
    listener: Arc<dyn StreamListener>,
    signatures: SignatureVerifier,
    chain: HashChainVerifier,
    reader: StreamFileReader,
    retry: RetryPolicy,
    cycle: Mutex<()>,
}

impl<S: StorageClient, A: AddressBookApi> Downloader<S, A> {
    /// Create a downloader.
    ///
    /// # Errors
    /// * `DownloaderError::Config` - the quorum fraction is invalid
    /// * `DownloaderError::BytesRequired` - the reader is set to drop file bytes
    pub fn new(
        config: DownloaderConfig,
        storage: Arc<S>,
        address_book: Arc<A>,
        parser: Arc<dyn StreamParserApi>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Self, DownloaderError> {
        if !config.reader.keep_bytes {
            return Err(DownloaderError::BytesRequired(config.stream_type));
        }
        let signatures = SignatureVerifier::new(&config.signatures)?;
        let chain = HashChainVerifier::new(&config.hash_chain);
        let reader = StreamFileReader::new(config.reader.clone());
        let retry = RetryPolicy::from_config(&config.retry);
        Ok(Self {
            config,
            storage,
            address_book,
            parser,
            checkpoints,
            listener: Arc::new(NoopListener),
            signatures,
            chain,
            reader,
            retry,
            cycle: Mutex::new(()),
        })
    }

    /// Attach a status listener.
    pub fn with_listener(mut self, listener: Arc<dyn StreamListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    fn stream(&self) -> StreamType {
        self.config.stream_type
    }

    // =========================================================================
    // LISTING / GROUPING
    // =========================================================================

    /// Candidate data files after `lower`, each with the nodes that published
    /// a signature for it.
    async fn list_candidates(
        &self,
        book: &AddressBook,
        lower: Option<ConsensusTimestamp>,
    ) -> Vec<(StreamFilename, Vec<NodeId>)> {
        let stream = self.stream();
        let limit = self.config.listing_limit();
        let marker = lower
            .map(|ts| StreamFilename::new(stream, FileKind::Signature, ts).listing_marker());

        let listings = join_all(book.node_ids().map(|node_id| {
            let marker = marker.as_deref();
            async move { (node_id, self.list_node(node_id, marker, lower).await) }
        }))
        .await;

        debug!(stream = %stream, stage = %CycleStage::Grouping, "[mn-05] Grouping listings");
        let mut groups: BTreeMap<StreamFilename, Vec<NodeId>> = BTreeMap::new();
        // Last file name of every listing that hit the limit.
        let mut cutoffs: Vec<String> = Vec::new();

        for (node_id, result) in listings {
            let keys = match result {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(node_id, error = %e, "[mn-05] Listing failed, node skipped");
                    continue;
                }
            };
            if keys.len() >= limit {
                if let Some(last) = keys.last().and_then(|k| k.rsplit('/').next()) {
                    cutoffs.push(last.to_string());
                }
            }

            for key in &keys {
                let name = match StreamFilename::from_key(key) {
                    Ok(name) => name,
                    Err(e) => {
                        debug!(key = %key, error = %e, "[mn-05] Ignoring unrecognised object");
                        continue;
                    }
                };
                if name.stream_type() != stream || name.kind() != FileKind::Signature {
                    continue;
                }
                if lower.is_some_and(|lower| name.timestamp() <= lower) {
                    continue;
                }
                groups.entry(name.to_data()).or_default().push(node_id);
            }
        }

        // A truncated listing only vouches for names up to its last key.
        // Keep the timestamp-ordered prefix every such listing covers.
        let mut candidates = Vec::new();
        for (name, nodes) in groups {
            if candidates.len() >= self.config.batch_size {
                break;
            }
            let signature_name = name.to_signature().to_string();
            let covered = cutoffs.iter().all(|c| signature_name.as_str() <= c.as_str());
            if !covered {
                if candidates.is_empty() {
                    candidates.push((name, nodes));
                }
                break;
            }
            candidates.push((name, nodes));
        }
        candidates
    }

    /// One node's listing after `marker`.
    ///
    /// The marker is truncated to the second, so a full page may hold only
    /// files at or before `lower`; such pages are skipped.
    async fn list_node(
        &self,
        node_id: NodeId,
        marker: Option<&str>,
        lower: Option<ConsensusTimestamp>,
    ) -> Result<Vec<String>, StorageError> {
        let prefix = self.stream().node_directory(node_id);
        let limit = self.config.listing_limit();
        let mut after = marker.map(|m| format!("{}{}", prefix, m));
        loop {
            let keys = self
                .retry
                .run("list", || self.storage.list(&prefix, after.as_deref(), limit))
                .await?;
            let stale = |key: &String| match StreamFilename::from_key(key) {
                Ok(name) => lower.is_some_and(|lower| name.timestamp() <= lower),
                Err(_) => true,
            };
            if keys.len() < limit || !keys.iter().all(stale) {
                return Ok(keys);
            }
            debug!(node_id, skipped = keys.len(), "[mn-05] Listing page holds no new files, paging on");
            after = keys.last().cloned();
        }
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    /// Fetch and decode every listed signature file for one candidate.
    /// Failures drop only the node concerned.
    async fn fetch_signatures(
        &self,
        name: StreamFilename,
        nodes: Vec<NodeId>,
    ) -> (StreamFilename, Vec<SignatureFile>) {
        let signature_name = name.to_signature();
        let fetched = join_all(nodes.into_iter().map(|node_id| {
            let key = self.stream().object_key(node_id, &signature_name);
            async move {
                let result = self
                    .retry
                    .run("fetch signature", || self.storage.fetch(&key))
                    .await;
                (node_id, key, result)
            }
        }))
        .await;

        let mut signatures = Vec::with_capacity(fetched.len());
        for (node_id, key, result) in fetched {
            match result.map(|bytes| SignatureFile::decode(node_id, &bytes)) {
                Ok(Ok(signature)) => signatures.push(signature),
                Ok(Err(e)) => {
                    warn!(node_id, key = %key, error = %e, "[mn-05] Malformed signature file, node skipped")
                }
                Err(e) => {
                    warn!(node_id, key = %key, error = %e, "[mn-05] Signature fetch failed, node skipped")
                }
            }
        }
        (name, signatures)
    }

    /// Consensus hash for a candidate, verified on the blocking pool.
    async fn select_consensus(
        &self,
        signatures: Vec<SignatureFile>,
        book: &Arc<AddressBook>,
    ) -> Result<Option<VerificationReport>, DownloaderError> {
        let verifier = self.signatures.clone();
        let snapshot = Arc::clone(book);
        spawn_blocking(move || verifier.select_consensus(&signatures, &snapshot))
            .await
            .map_err(|e| DownloaderError::TaskFailed(e.to_string()))
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// The data file from the first signer whose copy decodes and hashes to
    /// the consensus hash.
    async fn read_from_signers(
        &self,
        name: StreamFilename,
        report: &VerificationReport,
    ) -> Result<Option<StreamFile>, DownloaderError> {
        for &node_id in &report.signers {
            let key = self.stream().object_key(node_id, &name);
            let bytes = match self
                .retry
                .run("fetch data", || self.storage.fetch(&key))
                .await
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(node_id, key = %key, error = %e, "[mn-05] Data fetch failed, trying next signer");
                    continue;
                }
            };

            let reader = self.reader.clone();
            let decoded = spawn_blocking(move || reader.read(name, bytes))
                .await
                .map_err(|e| DownloaderError::TaskFailed(e.to_string()))?;
            match decoded {
                Ok(file) if file.hash == report.file_hash => return Ok(Some(file)),
                Ok(file) => warn!(
                    node_id,
                    key = %key,
                    expected = %report.file_hash,
                    found = %file.hash,
                    "[mn-05] Data file does not match consensus hash, trying next signer"
                ),
                Err(e) => {
                    warn!(node_id, key = %key, error = %e, "[mn-05] Malformed data file, trying next signer")
                }
            }
        }
        Ok(None)
    }

    // =========================================================================
    // CANDIDATE PIPELINE
    // =========================================================================

    async fn process(
        &self,
        name: StreamFilename,
        signatures: Vec<SignatureFile>,
        book: &Arc<AddressBook>,
        last: Option<&LastValidCheckpoint>,
    ) -> Result<Step, DownloaderError> {
        debug!(file = %name, stage = %CycleStage::VerifyingSignatures, signatures = signatures.len(), "[mn-05] Stage");
        let report = match self.select_consensus(signatures, book).await? {
            Some(report) => report,
            None => return Ok(Step::Halt(HaltReason::NoSignatures { file: name })),
        };
        match report.status {
            VerificationStatus::Accepted => {}
            VerificationStatus::NoSignatures => {
                return Ok(Step::Halt(HaltReason::NoSignatures { file: name }))
            }
            VerificationStatus::InsufficientStake => {
                return Ok(Step::Halt(HaltReason::InsufficientStake {
                    file: name,
                    valid_weight: report.valid_weight,
                    total_weight: report.total_weight,
                }))
            }
        }

        debug!(file = %name, stage = %CycleStage::Reading, hash = %report.file_hash, "[mn-05] Stage");
        let Some(file) = self.read_from_signers(name, &report).await? else {
            return Ok(Step::Halt(HaltReason::DataUnavailable { file: name }));
        };

        debug!(file = %name, stage = %CycleStage::VerifyingChain, "[mn-05] Stage");
        let expected = last.map(|c| c.file_hash);
        let verdict = self
            .chain
            .verify(Some(&file.previous_hash), expected.as_ref(), name.timestamp());
        if verdict == ChainVerdict::Discontinuous {
            return Ok(Step::Halt(HaltReason::Discontinuity {
                file: name,
                expected: expected.unwrap_or(Digest::ZERO),
                found: file.previous_hash,
            }));
        }

        debug!(file = %name, stage = %CycleStage::Persisting, count = file.count, "[mn-05] Stage");
        let summary = match self.parser.parse(&file).await {
            Ok(summary) => summary,
            Err(e) => {
                return Ok(Step::Halt(HaltReason::Persist {
                    file: name,
                    message: e.to_string(),
                }))
            }
        };

        debug!(file = %name, stage = %CycleStage::Checkpointing, "[mn-05] Stage");
        let checkpoint = LastValidCheckpoint::new(name, file.hash);
        if let Err(e) = self
            .retry
            .run("save checkpoint", || self.checkpoints.save(&checkpoint))
            .await
        {
            error!(file = %name, error = %e, "[mn-05] File persisted but checkpoint not saved");
            return Err(e.into());
        }

        Ok(Step::Accepted(AcceptedFile {
            name,
            hash: file.hash,
            previous_hash: file.previous_hash,
            verdict,
            signers: report.signers,
            valid_weight: report.valid_weight,
            total_weight: report.total_weight,
            records: summary.records,
            size: file.size,
            consensus_end: file.consensus_end,
        }))
    }
}

#[async_trait]
impl<S: StorageClient, A: AddressBookApi> DownloaderApi for Downloader<S, A> {
    fn stream_type(&self) -> StreamType {
        self.stream()
    }

    async fn run_cycle(
        &self,
        checkpoint: Option<LastValidCheckpoint>,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport, DownloaderError> {
        let stream = self.stream();
        let _cycle = self
            .cycle
            .try_lock()
            .map_err(|_| DownloaderError::CycleInProgress(stream))?;
        let started = Instant::now();

        if let Some(found) = checkpoint.map(|c| c.stream_type()) {
            if found != stream {
                return Err(DownloaderError::StreamMismatch {
                    expected: stream,
                    found,
                });
            }
        }

        let mut report = CycleReport {
            stream_type: stream,
            checkpoint,
            accepted: Vec::new(),
            candidates: 0,
            outcome: CycleOutcome::Completed,
            elapsed: Default::default(),
        };
        if *shutdown.borrow() {
            report.outcome = CycleOutcome::Cancelled;
            return Ok(report);
        }

        let book = self.address_book.current()?;
        let lower = checkpoint
            .map(|c| c.timestamp())
            .or(self.config.start_after);
        debug!(stream = %stream, stage = %CycleStage::Listing, ?lower, "[mn-05] Cycle started");

        let candidates = self.list_candidates(&book, lower).await;
        report.candidates = candidates.len();

        let mut fetches = pin!(futures::stream::iter(candidates)
            .map(|(name, nodes)| self.fetch_signatures(name, nodes))
            .buffered(self.config.max_concurrent_fetches.max(1)));

        while let Some((name, signatures)) = fetches.next().await {
            if *shutdown.borrow() {
                info!(stream = %stream, next = %name, "[mn-05] Stop requested, cycle cancelled");
                report.outcome = CycleOutcome::Cancelled;
                break;
            }

            match self
                .process(name, signatures, &book, report.checkpoint.as_ref())
                .await?
            {
                Step::Accepted(file) => {
                    info!(
                        stream = %stream,
                        file = %file.name,
                        hash = %file.hash,
                        verdict = %file.verdict,
                        records = file.records,
                        "[mn-05] File accepted"
                    );
                    report.checkpoint = Some(LastValidCheckpoint::new(file.name, file.hash));
                    self.listener.on_file_accepted(stream, &file);
                    report.accepted.push(file);
                }
                Step::Halt(reason) => {
                    error!(
                        stream = %stream,
                        stage = %reason.stage(),
                        file = %reason.file(),
                        reason = %reason,
                        "[mn-05] Cycle halted"
                    );
                    self.listener.on_halt(stream, &reason);
                    report.outcome = CycleOutcome::Halted(reason);
                    break;
                }
            }
        }

        report.elapsed = started.elapsed();
        debug!(
            stream = %stream,
            accepted = report.accepted.len(),
            candidates = report.candidates,
            elapsed = ?report.elapsed,
            "[mn-05] Cycle finished"
        );
        self.listener.on_cycle_complete(&report);
        Ok(report)
    }

    async fn download(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport, DownloaderError> {
        let stream = self.stream();
        let checkpoint = self
            .retry
            .run("load checkpoint", || self.checkpoints.load(stream))
            .await?;
        self.run_cycle(checkpoint, shutdown).await
    }
}
