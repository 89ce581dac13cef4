//! # Signature Verification Service
//!
//! Application service layer that implements `SignatureVerificationApi`.
//!
//! Each call takes one address book snapshot and uses it for the whole
//! decision, so a concurrent refresh cannot split a verdict across two
//! books.

use crate::domain::entities::{SignatureFile, VerificationReport};
use crate::domain::verifier::SignatureVerifier;
use crate::ports::inbound::SignatureVerificationApi;
use mn_01_address_book::{AddressBookApi, AddressBookError};
use shared_types::Digest;
use std::sync::Arc;

/// Signature Verification Service.
pub struct SignatureVerificationService<A: AddressBookApi> {
    verifier: SignatureVerifier,
    address_book: Arc<A>,
}

impl<A: AddressBookApi> SignatureVerificationService<A> {
    /// Create a new signature verification service.
    pub fn new(verifier: SignatureVerifier, address_book: Arc<A>) -> Self {
        Self {
            verifier,
            address_book,
        }
    }

    /// The underlying verifier.
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }
}

impl<A: AddressBookApi> SignatureVerificationApi for SignatureVerificationService<A> {
    fn verify(
        &self,
        file_hash: &Digest,
        signatures: &[SignatureFile],
    ) -> Result<VerificationReport, AddressBookError> {
        let book = self.address_book.current()?;
        Ok(self.verifier.verify(file_hash, signatures, &book))
    }

    fn select_consensus(
        &self,
        signatures: &[SignatureFile],
    ) -> Result<Option<VerificationReport>, AddressBookError> {
        let book = self.address_book.current()?;
        Ok(self.verifier.select_consensus(signatures, &book))
    }
}
