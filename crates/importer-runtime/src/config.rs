//! # Importer Configuration
//!
//! Loaded from an optional JSON file named by `MIRROR_CONFIG`, then
//! overridden by `MIRROR_*` environment variables, then validated.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MIRROR_DATA_DIR` | `data_dir` |
//! | `MIRROR_BUCKET_DIR` | `bucket_dir` |
//! | `MIRROR_ADDRESS_BOOK` | `address_book` |
//! | `MIRROR_METRICS_FILE` | `metrics_file` |
//! | `MIRROR_<STREAM>_ENABLED` | `<stream>.enabled` |
//! | `MIRROR_<STREAM>_POLL_INTERVAL_MS` | `<stream>.poll_interval_ms` |
//! | `MIRROR_<STREAM>_BATCH_SIZE` | `<stream>.batch_size` |
//! | `MIRROR_<STREAM>_MAX_CONCURRENT_FETCHES` | `<stream>.max_concurrent_fetches` |
//! | `MIRROR_<STREAM>_QUORUM_NUMERATOR` | `<stream>.quorum_numerator` |
//! | `MIRROR_<STREAM>_QUORUM_DENOMINATOR` | `<stream>.quorum_denominator` |
//! | `MIRROR_<STREAM>_BYPASS_UNTIL` | `<stream>.bypass_until` (ns since epoch) |
//! | `MIRROR_<STREAM>_START_AFTER` | `<stream>.start_after` (ns since epoch) |
//! | `MIRROR_<STREAM>_PERSIST_ATTEMPTS` | `<stream>.parser.persist_attempts` |
//!
//! `<STREAM>` is `RECORD`, `EVENT` or `BALANCE`.

use mn_02_signature_verification::{QuorumThreshold, SignatureVerificationConfig};
use mn_03_hash_chain::HashChainConfig;
use mn_04_stream_reader::ReaderConfig;
use mn_05_downloader::{DownloaderConfig, RetryConfig};
use mn_06_stream_parser::ParserConfig;
use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, StreamType};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Cause.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for `ImporterConfig`.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Cause.
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidVariable {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },

    /// The combined configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// PER-STREAM SETTINGS
// =============================================================================

/// Settings for one stream's download loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Whether a loop runs for this stream.
    pub enabled: bool,

    /// Pause between cycles that found nothing to do, in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum candidate files per cycle.
    pub batch_size: usize,

    /// Candidates whose signatures are fetched ahead concurrently.
    pub max_concurrent_fetches: usize,

    /// Quorum fraction numerator; valid stake must strictly exceed it.
    pub quorum_numerator: u64,

    /// Quorum fraction denominator.
    pub quorum_denominator: u64,

    /// Accept broken links for files stamped at or before this instant.
    pub bypass_until: Option<ConsensusTimestamp>,

    /// With no checkpoint, skip files stamped at or before this instant.
    pub start_after: Option<ConsensusTimestamp>,

    /// Storage and checkpoint retry policy.
    pub retry: RetryConfig,

    /// Persistence attempts and timeout.
    pub parser: ParserConfig,
}

impl Default for StreamSettings {
    fn default() -> Self {
        let signatures = SignatureVerificationConfig::default();
        Self {
            enabled: false,
            poll_interval_ms: 1_000,
            batch_size: 100,
            max_concurrent_fetches: 8,
            quorum_numerator: signatures.quorum_numerator,
            quorum_denominator: signatures.quorum_denominator,
            bypass_until: None,
            start_after: None,
            retry: RetryConfig::default(),
            parser: ParserConfig::default(),
        }
    }
}

impl StreamSettings {
    /// Create settings for testing (enabled, fast polling and retries).
    pub fn for_testing() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 10,
            batch_size: 10,
            max_concurrent_fetches: 4,
            retry: RetryConfig::for_testing(),
            parser: ParserConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Pause between idle cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Downloader configuration for `stream`.
    pub fn downloader_config(&self, stream: StreamType) -> DownloaderConfig {
        DownloaderConfig {
            stream_type: stream,
            batch_size: self.batch_size,
            max_concurrent_fetches: self.max_concurrent_fetches,
            start_after: self.start_after,
            retry: self.retry.clone(),
            signatures: SignatureVerificationConfig {
                quorum_numerator: self.quorum_numerator,
                quorum_denominator: self.quorum_denominator,
                ..SignatureVerificationConfig::default()
            },
            hash_chain: HashChainConfig {
                bypass_until: self.bypass_until,
            },
            reader: ReaderConfig::default(),
        }
    }

    fn validate(&self, stream: StreamType) -> Result<(), ConfigError> {
        let invalid = |what: &str| ConfigError::Invalid(format!("{}: {}", stream.label(), what));

        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms must be positive"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be positive"));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(invalid("max_concurrent_fetches must be positive"));
        }
        if self.retry.attempts == 0 {
            return Err(invalid("retry.attempts must be positive"));
        }
        if self.retry.timeout_ms == 0 {
            return Err(invalid("retry.timeout_ms must be positive"));
        }
        if self.parser.persist_attempts == 0 {
            return Err(invalid("parser.persist_attempts must be positive"));
        }
        QuorumThreshold::new(self.quorum_numerator, self.quorum_denominator)
            .map_err(|e| invalid(&e.to_string()))?;
        Ok(())
    }

    fn apply_overrides(
        &mut self,
        stream: StreamType,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |suffix: &str| format!("MIRROR_{}_{}", stream.label().to_uppercase(), suffix);

        if let Some(v) = parse_var(lookup, &var("ENABLED"))? {
            self.enabled = v;
        }
        if let Some(v) = parse_var(lookup, &var("POLL_INTERVAL_MS"))? {
            self.poll_interval_ms = v;
        }
        if let Some(v) = parse_var(lookup, &var("BATCH_SIZE"))? {
            self.batch_size = v;
        }
        if let Some(v) = parse_var(lookup, &var("MAX_CONCURRENT_FETCHES"))? {
            self.max_concurrent_fetches = v;
        }
        if let Some(v) = parse_var(lookup, &var("QUORUM_NUMERATOR"))? {
            self.quorum_numerator = v;
        }
        if let Some(v) = parse_var(lookup, &var("QUORUM_DENOMINATOR"))? {
            self.quorum_denominator = v;
        }
        if let Some(v) = parse_var::<i64>(lookup, &var("BYPASS_UNTIL"))? {
            self.bypass_until = Some(ConsensusTimestamp(v));
        }
        if let Some(v) = parse_var::<i64>(lookup, &var("START_AFTER"))? {
            self.start_after = Some(ConsensusTimestamp(v));
        }
        if let Some(v) = parse_var(lookup, &var("PERSIST_ATTEMPTS"))? {
            self.parser.persist_attempts = v;
        }
        Ok(())
    }
}

// =============================================================================
// IMPORTER CONFIG
// =============================================================================

/// Complete importer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Lock file, checkpoints and persisted output live here.
    pub data_dir: PathBuf,

    /// Root of the mirrored bucket.
    pub bucket_dir: PathBuf,

    /// Initial address book (JSON).
    pub address_book: PathBuf,

    /// Prometheus text file rewritten after each cycle.
    pub metrics_file: Option<PathBuf>,

    /// How long to wait for loops to stop on shutdown, in milliseconds.
    pub shutdown_grace_ms: u64,

    /// Record stream settings.
    pub record: StreamSettings,

    /// Event stream settings.
    pub event: StreamSettings,

    /// Balance stream settings.
    pub balance: StreamSettings,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bucket_dir: PathBuf::from("./bucket"),
            address_book: PathBuf::from("./address_book.json"),
            metrics_file: None,
            shutdown_grace_ms: 5_000,
            record: StreamSettings {
                enabled: true,
                ..StreamSettings::default()
            },
            event: StreamSettings::default(),
            balance: StreamSettings::default(),
        }
    }
}

impl ImporterConfig {
    /// Create a config for testing rooted at `root`.
    pub fn for_testing(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            bucket_dir: root.join("bucket"),
            address_book: root.join("address_book.json"),
            metrics_file: None,
            shutdown_grace_ms: 1_000,
            record: StreamSettings::for_testing(),
            event: StreamSettings::default(),
            balance: StreamSettings::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("MIRROR_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("MIRROR_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("MIRROR_BUCKET_DIR") {
            self.bucket_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MIRROR_ADDRESS_BOOK") {
            self.address_book = PathBuf::from(path);
        }
        if let Some(path) = lookup("MIRROR_METRICS_FILE") {
            self.metrics_file = Some(PathBuf::from(path));
        }
        for stream in StreamType::ALL {
            self.settings_mut(stream).apply_overrides(stream, lookup)?;
        }
        Ok(())
    }

    /// Check the combined configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_streams().is_empty() {
            return Err(ConfigError::Invalid("no stream is enabled".into()));
        }
        for stream in self.enabled_streams() {
            self.settings(stream).validate(stream)?;
        }
        Ok(())
    }

    /// Settings of `stream`.
    pub fn settings(&self, stream: StreamType) -> &StreamSettings {
        match stream {
            StreamType::Record => &self.record,
            StreamType::Event => &self.event,
            StreamType::Balance => &self.balance,
        }
    }

    fn settings_mut(&mut self, stream: StreamType) -> &mut StreamSettings {
        match stream {
            StreamType::Record => &mut self.record,
            StreamType::Event => &mut self.event,
            StreamType::Balance => &mut self.balance,
        }
    }

    /// Streams with a running loop.
    pub fn enabled_streams(&self) -> Vec<StreamType> {
        StreamType::ALL
            .into_iter()
            .filter(|stream| self.settings(*stream).enabled)
            .collect()
    }

    /// Directory holding one checkpoint file per stream.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.data_dir.join("checkpoints")
    }

    /// File holding address book refresh state across restarts.
    pub fn address_book_state_file(&self) -> PathBuf {
        self.data_dir.join("address_book.state.json")
    }

    /// Directory holding persisted stream files.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("output")
    }

    /// Shutdown grace period.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVariable {
                name: name.to_string(),
                value,
            }),
    }
}
