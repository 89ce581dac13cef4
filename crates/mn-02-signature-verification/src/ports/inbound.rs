//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::{SignatureFile, VerificationReport};
use mn_01_address_book::AddressBookError;
use shared_types::Digest;

/// Primary Signature Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`). Both operations
/// are pure computation and may be run on a blocking thread.
pub trait SignatureVerificationApi: Send + Sync {
    /// Verify `signatures` for a known candidate hash against the current
    /// address book.
    ///
    /// # Errors
    /// * `AddressBookError::Unavailable` - no address book loaded
    fn verify(
        &self,
        file_hash: &Digest,
        signatures: &[SignatureFile],
    ) -> Result<VerificationReport, AddressBookError>;

    /// Choose the consensus hash among the hashes the signatures declare.
    ///
    /// `Ok(None)` iff `signatures` is empty.
    fn select_consensus(
        &self,
        signatures: &[SignatureFile],
    ) -> Result<Option<VerificationReport>, AddressBookError>;
}
