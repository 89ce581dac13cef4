//! # Parser Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream parser configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Attempts per file before the error is surfaced. At least 1.
    pub persist_attempts: u32,

    /// Upper bound for one attempt (all records plus commit), in milliseconds.
    pub persist_timeout_ms: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            persist_attempts: 3,
            persist_timeout_ms: 30_000,
        }
    }
}

impl ParserConfig {
    /// Create a config for testing (short timeout).
    pub fn for_testing() -> Self {
        Self {
            persist_attempts: 2,
            persist_timeout_ms: 1_000,
        }
    }

    /// Per-attempt timeout.
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    /// Attempt count, never below one.
    pub fn attempts(&self) -> u32 {
        self.persist_attempts.max(1)
    }
}
