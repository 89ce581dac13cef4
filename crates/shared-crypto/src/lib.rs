//! # Shared Crypto - Stream File Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-384 | Stream file content hashes |
//! | `signatures` | Ed25519 | Node signature files |
//! | `ecdsa` | secp256k1 | Node signature files |
//! | `scheme` | dispatch | Verify by signature-type byte |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency
//! - **secp256k1**: RFC 6979 deterministic, SHA-256 message digest
//! - **SHA-384**: 48-byte digests, the width of every chain link

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod scheme;
pub mod signatures;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha384, sha384_many, Sha384Hasher};
pub use scheme::{verify_signature, NodeKeyPair, SignatureScheme};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
