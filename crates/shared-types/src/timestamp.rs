//! # Consensus Timestamps
//!
//! Nanosecond-resolution instants assigned by consensus.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Nanoseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConsensusTimestamp(pub i64);

impl ConsensusTimestamp {
    /// The Unix epoch.
    pub const EPOCH: ConsensusTimestamp = ConsensusTimestamp(0);

    /// Build from whole seconds and a nanosecond adjustment.
    pub fn from_parts(seconds: i64, nanos: u32) -> Self {
        Self(seconds * NANOS_PER_SECOND + i64::from(nanos))
    }

    /// Nanoseconds since the epoch.
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch.
    pub fn seconds(&self) -> i64 {
        self.0.div_euclid(NANOS_PER_SECOND)
    }

    /// Nanosecond part within the second.
    pub fn subsec_nanos(&self) -> u32 {
        self.0.rem_euclid(NANOS_PER_SECOND) as u32
    }

    /// Convert to a UTC date-time. `None` outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.seconds(), self.subsec_nanos())
    }

    /// Convert from a UTC date-time. `None` if it overflows i64 nanoseconds.
    pub fn from_datetime(datetime: &DateTime<Utc>) -> Option<Self> {
        datetime.timestamp_nanos_opt().map(Self)
    }

    /// Monthly partition label (`YYYY_MM`) this instant falls in.
    pub fn month_partition(&self) -> String {
        match self.to_datetime() {
            Some(dt) => format!("{:04}_{:02}", dt.year(), dt.month()),
            None => "out_of_range".to_string(),
        }
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds(), self.subsec_nanos())
    }
}

impl From<i64> for ConsensusTimestamp {
    fn from(nanos: i64) -> Self {
        Self(nanos)
    }
}
