//! # Domain Layer
//!
//! Aggregates derived while parsing, summaries and errors.

pub mod aggregates;
pub mod entities;
pub mod errors;
