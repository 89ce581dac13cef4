//! # MN-01 Address Book
//!
//! The set of known consensus nodes, their public keys and stake weights.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (Domain + Ports + Service)
//!
//! ## Purpose
//!
//! Every signature quorum is computed against an `AddressBook` snapshot.
//! Snapshots are immutable: a refresh builds a new one and swaps it in
//! wholesale, so a verification in flight keeps the snapshot it started with.
//!
//! ## Module Structure
//!
//! ```text
//! mn-01-address-book/
//! ├── domain/          # AddressBookEntry, AddressBook, JSON codec, errors
//! ├── ports/           # AddressBookApi (inbound)
//! ├── service.rs       # AddressBookService: load, swap, staged file updates
//! └── config.rs        # AddressBookConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use config::AddressBookConfig;
pub use domain::{AddressBook, AddressBookEntry, AddressBookError, ADDRESS_BOOK_FILE_ID};
pub use ports::AddressBookApi;
pub use service::AddressBookService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
