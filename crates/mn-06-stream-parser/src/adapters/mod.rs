//! # Adapters
//!
//! In-memory persister used by tests and dry runs.

pub mod memory;
