//! # Stream Parser Subsystem (MN-06)
//!
//! Turns a verified `StreamFile` into persisted state.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Per-file aggregates (topic message
//!   lookups), parse summaries, errors
//! - **Ports Layer** (`ports/`): `StreamParserApi` (inbound), `Persister`
//!   (outbound)
//! - **Service Layer** (`service.rs`): `StreamFileParser`
//! - **Adapters** (`adapters/`): `InMemoryPersister`
//!
//! ## Persistence Contract
//!
//! One file is one transaction:
//!
//! ```text
//! begin_file ─→ persist_record × count ─→ persist_file ─→ commit
//!      │                 │                      │            │
//!      └─────────────────┴──────── error ───────┴────────────┴─→ rollback
//! ```
//!
//! A rolled-back file is retried from its first record up to the configured
//! attempt count. Records are never skipped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::memory::{CommittedFile, InMemoryPersister};
pub use config::ParserConfig;
pub use domain::aggregates::{FileAggregates, TopicMessageLookup};
pub use domain::entities::ParseSummary;
pub use domain::errors::{ParserError, PersistError};
pub use ports::inbound::StreamParserApi;
pub use ports::outbound::Persister;
pub use service::StreamFileParser;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
