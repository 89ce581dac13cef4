//! # Adapters
//!
//! In-memory implementations of the outbound ports, for tests and local runs.

pub mod memory;
