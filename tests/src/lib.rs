//! # Mirror Importer Test Suite
//!
//! Cross-crate tests driving the full ingestion pipeline: signature files
//! and data files go into storage, verified files come out of a persister,
//! and the checkpoint tracks the chain.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # Simulated consensus network
//!     ├── pipeline.rs        # Quorum, chain and checkpoint scenarios
//!     ├── stream_format.rs   # Encode/read and hash linkage properties
//!     └── address_book.rs    # Address book refresh through file updates
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mn-tests
//! cargo test -p mn-tests integration::pipeline::
//! ```

#![allow(dead_code)]

pub mod integration;
