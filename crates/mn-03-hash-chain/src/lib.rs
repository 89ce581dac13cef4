//! # MN-03 Hash Chain
//!
//! Continuity checks between consecutive stream files.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Pure domain, no ports
//!
//! ## Purpose
//!
//! Every stream file embeds the content hash of its predecessor. A file is
//! accepted only if that embedded hash equals the hash of the last accepted
//! file. Known historical gaps are tolerated up to a configured
//! `bypass_until` instant; past it a mismatch halts the stream.
//!
//! ## Verdicts
//!
//! | Verdict | Meaning | Accept? |
//! |---------|---------|---------|
//! | `Genesis` | No previous checkpoint | yes |
//! | `Continuous` | Embedded hash matches | yes |
//! | `Bypassed` | Mismatch inside the bypass window | yes, logged |
//! | `Discontinuous` | Mismatch outside the window | no, halt |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;

// Re-exports
pub use config::HashChainConfig;
pub use domain::{
    verify_link, verify_sequence, ChainLink, ChainVerdict, HashChainError, HashChainVerifier,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
