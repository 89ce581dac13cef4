//! # Domain Layer
//!
//! Pure verification logic. No I/O.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod quorum;
pub mod verifier;
