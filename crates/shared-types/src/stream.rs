//! # Stream Types and File Names
//!
//! Stream files are named by their consensus start instant, rendered as an
//! ISO-8601 UTC string with `:` replaced by `_`, plus a type-specific
//! extension. Data and signature files share the timestamp prefix and differ
//! only in the extension:
//!
//! ```text
//! recordstreams/record3/2019-08-30T18_10_00.419072Z.rcd
//! recordstreams/record3/2019-08-30T18_10_00.419072Z.rcd_sig
//! ```
//!
//! The fraction is printed with 0, 3, 6 or 9 digits, whichever is the
//! shortest exact group. Parsing only accepts that canonical rendering so a
//! parsed name always renders back to the same bytes.

use crate::entities::NodeId;
use crate::errors::FilenameError;
use crate::timestamp::ConsensusTimestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TIME_FORMAT: &str = "%Y-%m-%dT%H_%M_%S%.fZ";

/// The independent hash chains produced by consensus nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// Transaction records.
    Record,
    /// Consensus events.
    Event,
    /// Account balance snapshots.
    Balance,
}

impl StreamType {
    /// All stream types, in a stable order.
    pub const ALL: [StreamType; 3] = [StreamType::Record, StreamType::Event, StreamType::Balance];

    /// Top-level storage directory for this stream.
    pub fn path(&self) -> &'static str {
        match self {
            StreamType::Record => "recordstreams",
            StreamType::Event => "eventsStreams",
            StreamType::Balance => "accountBalances",
        }
    }

    /// Per-node directory prefix, followed by the node id.
    pub fn node_prefix(&self) -> &'static str {
        match self {
            StreamType::Record => "record",
            StreamType::Event => "events_",
            StreamType::Balance => "balance",
        }
    }

    /// Extension of data files.
    pub fn data_extension(&self) -> &'static str {
        match self {
            StreamType::Record => "rcd",
            StreamType::Event => "evts",
            StreamType::Balance => "bal",
        }
    }

    /// Extension of signature files.
    pub fn signature_extension(&self) -> &'static str {
        match self {
            StreamType::Record => "rcd_sig",
            StreamType::Event => "evts_sig",
            StreamType::Balance => "bal_sig",
        }
    }

    /// Lowercase label used in logs, metrics and checkpoint keys.
    pub fn label(&self) -> &'static str {
        match self {
            StreamType::Record => "record",
            StreamType::Event => "event",
            StreamType::Balance => "balance",
        }
    }

    /// Storage directory holding one node's files, with trailing slash.
    pub fn node_directory(&self, node_id: NodeId) -> String {
        format!("{}/{}{}/", self.path(), self.node_prefix(), node_id)
    }

    /// Full object key of a file published by `node_id`.
    pub fn object_key(&self, node_id: NodeId, filename: &StreamFilename) -> String {
        format!("{}{}", self.node_directory(node_id), filename)
    }

    /// Recover the publishing node from an object key of this stream.
    pub fn node_id_from_key(&self, key: &str) -> Option<NodeId> {
        let rest = key.strip_prefix(self.path())?.strip_prefix('/')?;
        let (dir, _file) = rest.split_once('/')?;
        dir.strip_prefix(self.node_prefix())?.parse().ok()
    }

    fn from_extension(extension: &str) -> Option<(StreamType, FileKind)> {
        StreamType::ALL.iter().find_map(|stream| {
            if extension == stream.data_extension() {
                Some((*stream, FileKind::Data))
            } else if extension == stream.signature_extension() {
                Some((*stream, FileKind::Signature))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a name refers to a data file or its signature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// The stream file itself.
    Data,
    /// A node's signature over the data file's hash.
    Signature,
}

/// A parsed stream file name.
///
/// Ordering is by consensus timestamp first. Within one second the rendered
/// names do not sort the same way (see `listing_marker`), so sort parsed
/// names, not strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamFilename {
    timestamp: ConsensusTimestamp,
    stream_type: StreamType,
    kind: FileKind,
}

impl StreamFilename {
    /// Create a name for the given instant.
    pub fn new(stream_type: StreamType, kind: FileKind, timestamp: ConsensusTimestamp) -> Self {
        Self {
            timestamp,
            stream_type,
            kind,
        }
    }

    /// Parse the last path segment of an object key.
    pub fn from_key(key: &str) -> Result<Self, FilenameError> {
        let name = key.rsplit('/').next().unwrap_or(key);
        name.parse()
    }

    /// Consensus start instant encoded in the name.
    pub fn timestamp(&self) -> ConsensusTimestamp {
        self.timestamp
    }

    /// Stream this file belongs to.
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// Data or signature.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// The data file sharing this name's timestamp.
    pub fn to_data(&self) -> Self {
        Self {
            kind: FileKind::Data,
            ..*self
        }
    }

    /// The signature file sharing this name's timestamp.
    pub fn to_signature(&self) -> Self {
        Self {
            kind: FileKind::Signature,
            ..*self
        }
    }

    /// Start-after marker for storage listings that resumes at this name.
    ///
    /// Truncated to the whole second: within one second a fractional name
    /// sorts before the whole-second name, so the full name is not a safe
    /// marker. Callers filter the listed names against `self` afterwards.
    pub fn listing_marker(&self) -> String {
        let seconds = ConsensusTimestamp::from_parts(self.timestamp.seconds(), 0);
        match seconds.to_datetime() {
            Some(dt) => dt.format("%Y-%m-%dT%H_%M_%S").to_string(),
            None => String::new(),
        }
    }

    fn extension(&self) -> &'static str {
        match self.kind {
            FileKind::Data => self.stream_type.data_extension(),
            FileKind::Signature => self.stream_type.signature_extension(),
        }
    }

    fn render_instant(&self) -> Result<String, FilenameError> {
        let datetime = self
            .timestamp
            .to_datetime()
            .ok_or(FilenameError::TimestampOutOfRange(self.timestamp.as_nanos()))?;
        Ok(datetime.format(TIME_FORMAT).to_string())
    }
}

impl fmt::Display for StreamFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render_instant() {
            Ok(instant) => write!(f, "{}.{}", instant, self.extension()),
            Err(_) => write!(f, "{}.{}", self.timestamp, self.extension()),
        }
    }
}

impl FromStr for StreamFilename {
    type Err = FilenameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let (instant, extension) = name
            .rsplit_once('.')
            .ok_or_else(|| FilenameError::MissingExtension(name.to_string()))?;

        let (stream_type, kind) = StreamType::from_extension(extension)
            .ok_or_else(|| FilenameError::UnknownExtension(extension.to_string()))?;

        let naive = NaiveDateTime::parse_from_str(instant, TIME_FORMAT)
            .map_err(|e| FilenameError::InvalidTimestamp(format!("{}: {}", instant, e)))?;
        let timestamp = ConsensusTimestamp::from_datetime(&naive.and_utc())
            .ok_or_else(|| FilenameError::InvalidTimestamp(instant.to_string()))?;

        let parsed = StreamFilename::new(stream_type, kind, timestamp);
        if parsed.render_instant()? != instant {
            return Err(FilenameError::NonCanonical(name.to_string()));
        }
        Ok(parsed)
    }
}

impl Serialize for StreamFilename {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StreamFilename {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
