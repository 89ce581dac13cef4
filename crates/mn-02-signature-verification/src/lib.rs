//! # Signature Verification Subsystem (MN-02)
//!
//! Decides whether enough stake vouches for a stream file's content hash.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Signature file codec, quorum arithmetic,
//!   parallel verification. No I/O
//! - **Ports Layer** (`ports/`): `SignatureVerificationApi`
//! - **Service Layer** (`service.rs`): Binds the verifier to the current
//!   address book
//!
//! ## Verification Rules
//!
//! - Only signatures whose declared hash equals the candidate hash count
//! - Unknown node ids are ignored, not errors
//! - A node's first signature is the only one counted
//! - Accepted iff valid stake strictly exceeds the configured fraction of
//!   total stake

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use config::SignatureVerificationConfig;
pub use domain::entities::{
    RejectionReason, SignatureFile, SignatureRejection, VerificationReport, VerificationStatus,
};
pub use domain::errors::{SignatureFileError, ThresholdError};
pub use domain::quorum::QuorumThreshold;
pub use domain::verifier::SignatureVerifier;
pub use ports::inbound::SignatureVerificationApi;
pub use service::SignatureVerificationService;
