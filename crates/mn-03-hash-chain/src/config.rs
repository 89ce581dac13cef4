//! # Hash Chain Configuration

use serde::{Deserialize, Serialize};
use shared_types::ConsensusTimestamp;

/// Hash chain configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainConfig {
    /// Files stamped at or before this instant are accepted despite a
    /// broken link. `None` disables the bypass.
    #[serde(default)]
    pub bypass_until: Option<ConsensusTimestamp>,
}

impl HashChainConfig {
    /// Create a config for testing (no bypass).
    pub fn for_testing() -> Self {
        Self { bypass_until: None }
    }
}
