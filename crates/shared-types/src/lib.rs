//! # Shared Types Crate
//!
//! Value types shared by every importer subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Digests, timestamps, file names and domain
//!   records are defined once here and used by reader, verifiers and parser.
//! - **Bit-exact names**: `StreamFilename` renders and parses the on-storage
//!   naming convention; the downloader relies on its ordering.
//! - **No I/O**: Nothing in this crate touches storage or the network.

pub mod digest;
pub mod entities;
pub mod errors;
pub mod stream;
pub mod timestamp;

pub use digest::{Digest, DIGEST_LEN};
pub use entities::*;
pub use errors::*;
pub use stream::{FileKind, StreamFilename, StreamType};
pub use timestamp::ConsensusTimestamp;
