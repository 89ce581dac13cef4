//! # Downloader Configuration

use mn_02_signature_verification::SignatureVerificationConfig;
use mn_03_hash_chain::HashChainConfig;
use mn_04_stream_reader::ReaderConfig;
use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, StreamType};
use std::time::Duration;

/// Bounded retry for storage and checkpoint calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call, including the first. At least 1.
    pub attempts: u32,

    /// Delay before the second attempt, in milliseconds. Doubles per attempt.
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub max_backoff_ms: u64,

    /// Timeout of a single attempt in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            timeout_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Create a config for testing (fast backoff).
    pub fn for_testing() -> Self {
        Self {
            attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
            timeout_ms: 1_000,
        }
    }

    /// Initial backoff.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff ceiling.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Downloader configuration for one stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Stream this downloader follows.
    pub stream_type: StreamType,

    /// Maximum candidate files per cycle.
    pub batch_size: usize,

    /// Candidates whose signatures are fetched ahead concurrently.
    pub max_concurrent_fetches: usize,

    /// With no checkpoint, only files stamped after this are considered.
    #[serde(default)]
    pub start_after: Option<ConsensusTimestamp>,

    /// Storage and checkpoint retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Quorum settings.
    #[serde(default)]
    pub signatures: SignatureVerificationConfig,

    /// Bypass window.
    #[serde(default)]
    pub hash_chain: HashChainConfig,

    /// Data file limits.
    #[serde(default)]
    pub reader: ReaderConfig,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self::for_stream(StreamType::Record)
    }
}

impl DownloaderConfig {
    /// Production defaults for `stream_type`.
    pub fn for_stream(stream_type: StreamType) -> Self {
        Self {
            stream_type,
            batch_size: 100,
            max_concurrent_fetches: 8,
            start_after: None,
            retry: RetryConfig::default(),
            signatures: SignatureVerificationConfig::default(),
            hash_chain: HashChainConfig::default(),
            reader: ReaderConfig::default(),
        }
    }

    /// Create a config for testing (small batches, fast retries).
    pub fn for_testing(stream_type: StreamType) -> Self {
        Self {
            stream_type,
            batch_size: 10,
            max_concurrent_fetches: 4,
            start_after: None,
            retry: RetryConfig::for_testing(),
            signatures: SignatureVerificationConfig::for_testing(),
            hash_chain: HashChainConfig::for_testing(),
            reader: ReaderConfig::for_testing(),
        }
    }

    /// Keys requested per node listing. Data and signature files interleave,
    /// so twice the batch size covers a full batch of candidates.
    pub fn listing_limit(&self) -> usize {
        self.batch_size.max(1).saturating_mul(2)
    }
}
