//! # MN-04 Stream Reader
//!
//! Decodes the binary container format of record, event and balance files.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Pure domain, no ports
//!
//! ## Format
//!
//! ```text
//! u8  version            0x01 = V1 (legacy), 0x02 = V2
//! V2: u32 hapi_version
//! u8  0x01 PREV_HASH     [48] previous file hash
//! chunks*
//!   V1: u8 marker | u32 len | payload
//!   V2: u8 marker | u32 len | payload | u32 crc32(payload)
//! [u8 0x03 SIGNATURE     [48] content hash]      optional, last
//! ```
//!
//! The version byte selects both the chunk layout and the hashing scheme:
//!
//! | Version | Content hash |
//! |---------|--------------|
//! | V1 | `SHA384(header ‖ SHA384(chunks))` |
//! | V2 | `SHA384(everything before the trailer)` |
//!
//! ## Module Structure
//!
//! ```text
//! mn-04-stream-reader/
//! ├── domain/
//! │   ├── format.rs      # Markers, versions, chunk layouts, payload codec
//! │   ├── cursor.rs      # Bounds-checked big-endian reads
//! │   ├── reader.rs      # StreamFileReader (validating decoder)
//! │   ├── stream_file.rs # StreamFile, StreamItems, StreamFileMetadata
//! │   ├── writer.rs      # StreamFileWriter (encoder)
//! │   └── errors.rs      # ReaderError
//! └── config.rs          # ReaderConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;

// Re-exports
pub use config::ReaderConfig;
pub use domain::errors::ReaderError;
pub use domain::format::{ChunkLayout, FormatVersion};
pub use domain::reader::StreamFileReader;
pub use domain::stream_file::{StreamFile, StreamFileMetadata, StreamItems};
pub use domain::writer::{EncodedStreamFile, StreamFileWriter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
