//! # Domain Layer
//!
//! Hash chain verdicts and the rules that produce them.

pub mod entities;
pub mod errors;
pub mod verifier;

pub use entities::{ChainLink, ChainVerdict};
pub use errors::HashChainError;
pub use verifier::{verify_link, verify_sequence, HashChainVerifier};
