//! # Domain Layer
//!
//! Cycle bookkeeping, retry policy and error types.

pub mod entities;
pub mod errors;
pub mod retry;
