//! # Reader Configuration

use crate::domain::format::MAX_ITEM_LEN;
use serde::{Deserialize, Serialize};

/// Stream reader configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Largest accepted chunk payload, in bytes.
    pub max_item_len: usize,

    /// Keep raw bytes on the `StreamFile` so items can be re-read.
    pub keep_bytes: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_item_len: MAX_ITEM_LEN,
            keep_bytes: true,
        }
    }
}

impl ReaderConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            max_item_len: 64 * 1024,
            keep_bytes: true,
        }
    }
}
