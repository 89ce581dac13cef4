//! # Adapters
//!
//! Filesystem-backed implementations of the downloader and parser ports,
//! plus the process-level data directory lock.

pub mod address_book;
pub mod checkpoint;
pub mod filesystem;
pub mod jsonl;
pub mod lock;
pub mod metrics;

pub use address_book::{AddressBookPersister, RefreshStateError, RefreshStateFile};
pub use checkpoint::FileCheckpointStore;
pub use filesystem::FileSystemStorage;
pub use jsonl::JsonLinesPersister;
pub use lock::{DataDirLock, LockError};
pub use metrics::MetricsListener;
