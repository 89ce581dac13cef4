//! # Importer Runtime Library
//!
//! Wires the importer subsystems to local storage and exposes them for
//! testing. The process entry point is the `main.rs` binary.
//!
//! ## Wiring
//!
//! ```text
//!  bucket dir ─→ FileSystemStorage ─┐
//!  address_book.json ─→ AddressBookService ─┬─→ Downloader (per stream)
//!  checkpoints/ ─→ FileCheckpointStore ─────┤        │
//!                                           │        ↓
//!                              MetricsListener   StreamFileParser
//!                                                    │
//!                                   AddressBookPersister(JsonLinesPersister)
//!                                                    │
//!                                                    ↓
//!                                                output/
//! ```
//!
//! ## Modules
//!
//! - `config` - `ImporterConfig` from a JSON file plus `MIRROR_*` variables
//! - `adapters` - filesystem storage, checkpoints, persister, lock, metrics
//! - `runtime` - `ImporterRuntime` and the per-stream loop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod runtime;

pub use config::{ConfigError, ImporterConfig, StreamSettings};
pub use runtime::{run_stream_loop, ImporterRuntime, StreamDownloader};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
